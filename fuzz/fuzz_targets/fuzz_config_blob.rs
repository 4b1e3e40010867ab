//! Fuzz target: `EvseConfig::from_blob`
//!
//! Arbitrary bytes from calibration storage must never panic the decoder.
//! Anything accepted must be valid and survive a re-encode unchanged.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use acevse::config::EvseConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = EvseConfig::from_blob(data) {
        assert!(config.validate().is_ok());
        let blob = config.to_blob().expect("valid config encodes");
        let again = EvseConfig::from_blob(&blob).expect("own blob decodes");
        assert_eq!(config, again);
    }
});
