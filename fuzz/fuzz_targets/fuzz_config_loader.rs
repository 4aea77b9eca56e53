#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    if let Ok(cfg) = soiling_config::load_toml(data) {
        if cfg.validate().is_ok() {
            assert!(cfg.serial.baud > 0);
            assert!(cfg.monitor.channel_capacity >= 1);
        }
    }
});
