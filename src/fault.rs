//! Fault registry.
//!
//! Holds the single latched [`ErrorCode`] with its provenance and a short
//! history of every report for diagnostics.
//!
//! ## Fault lifecycle
//!
//! 1. A leaf (pilot interpreter, state handler, init code) calls
//!    [`FaultReporter::report`].  Reporting cannot fail.
//! 2. Latching codes overwrite the record; transient codes only go to the
//!    history.  A latched fatal code is never displaced by a recoverable
//!    one, which also goes to the history only.
//! 3. The orchestrator sees a non-`None` [`FaultRegistry::last`] and forces
//!    the state machine into `Fault`.
//! 4. Only the `Fault` state clears the registry, once CP is back at 12 V
//!    and the contactor is confirmed open.
//!
//! Leaves only ever see `&mut dyn FaultReporter`, so they cannot clear.

use heapless::HistoryBuffer;
use log::{error, warn};

use crate::error::ErrorCode;

/// Number of reports kept for diagnostics.
pub const HISTORY_LEN: usize = 8;

/// One report with where and when it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRecord {
    pub code: ErrorCode,
    /// Reporting component, e.g. `"control_pilot"`.
    pub source: &'static str,
    /// Source line of the report site.
    pub line: u32,
    /// Control tick during which the report was made.
    pub tick: u64,
}

/// Report-only view of the registry handed to leaf components.
pub trait FaultReporter {
    fn report(&mut self, code: ErrorCode, source: &'static str, line: u32);
}

pub struct FaultRegistry {
    latched: Option<FaultRecord>,
    history: HistoryBuffer<FaultRecord, HISTORY_LEN>,
    tick: u64,
}

impl Default for FaultRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultRegistry {
    pub fn new() -> Self {
        Self {
            latched: None,
            history: HistoryBuffer::new(),
            tick: 0,
        }
    }

    /// Set the tick stamped on subsequent reports.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Latched code, `ErrorCode::None` when clear.
    pub fn last(&self) -> ErrorCode {
        self.latched.map_or(ErrorCode::None, |r| r.code)
    }

    /// Latched record with provenance.
    pub fn record(&self) -> Option<FaultRecord> {
        self.latched
    }

    pub fn is_clear(&self) -> bool {
        self.latched.is_none()
    }

    pub fn clear(&mut self) {
        self.latched = None;
    }

    /// Reports oldest first.
    pub fn history(&self) -> impl Iterator<Item = &FaultRecord> {
        self.history.oldest_ordered()
    }
}

impl FaultReporter for FaultRegistry {
    fn report(&mut self, code: ErrorCode, source: &'static str, line: u32) {
        if code.is_none() {
            warn!("Ignoring empty fault report from {}:{}", source, line);
            return;
        }

        let record = FaultRecord {
            code,
            source,
            line,
            tick: self.tick,
        };
        self.history.write(record);

        if let Some(held) = self.latched.filter(|r| !r.code.is_recoverable() && code.is_recoverable()) {
            warn!("{:?} from {}:{} kept behind fatal {:?}", code, source, line, held.code);
            return;
        }

        if code.latches() {
            error!("FAULT {:?} ({}) from {}:{} at tick {}", code, code, source, line, self.tick);
            self.latched = Some(record);
        } else {
            warn!("Transient {:?} ({}) from {}:{}", code, code, source, line);
        }
    }
}
