//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the charging service
//! against the recording mock in `mock_hw`.  All tests run on the host
//! with no real hardware required.

mod charging_flow_tests;
mod fault_recovery_tests;
mod sim_bench_tests;
