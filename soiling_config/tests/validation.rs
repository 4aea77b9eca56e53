use rstest::rstest;
use soiling_config::{DEFAULT_BAUD, load_file, load_toml};
use std::io::Write;

#[test]
fn full_document_round_trips_values() {
    let toml = r#"
[serial]
port = "/dev/ttyUSB0"
baud = 9600
read_timeout_ms = 500

[monitor]
poll_ms = 100
channel_capacity = 32
disconnect_grace_ms = 800

[calibration]
path = "/var/lib/soiling/calibration.json"

[logging]
level = "debug"
rotation = "daily"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.serial.port.as_deref(), Some("/dev/ttyUSB0"));
    assert_eq!(cfg.serial.baud, 9600);
    assert_eq!(cfg.monitor.channel_capacity, 32);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[rstest]
#[case("baud = \"9600\"", 9600)]
#[case("baud = \"fast\"", DEFAULT_BAUD)]
#[case("baud = 0", DEFAULT_BAUD)]
#[case("baud = -5", DEFAULT_BAUD)]
#[case("baud = 9600.5", DEFAULT_BAUD)]
#[case("", DEFAULT_BAUD)]
fn baud_is_tolerant(#[case] line: &str, #[case] expected: u32) {
    let toml = format!("[serial]\n{line}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    assert_eq!(cfg.serial.baud, expected);
}

#[rstest]
#[case("[serial]\nread_timeout_ms = 0", "read_timeout_ms must be in [1, 1000]")]
#[case("[serial]\nread_timeout_ms = 5000", "read_timeout_ms must be in [1, 1000]")]
#[case("[serial]\nport = \" \"", "serial.port must not be empty")]
#[case("[monitor]\npoll_ms = 0", "poll_ms must be >= 1")]
#[case("[monitor]\nchannel_capacity = 0", "channel_capacity must be >= 1")]
#[case("[monitor]\ndisconnect_grace_ms = 10", "disconnect_grace_ms must be >=")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_out_of_range(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "error {err} should mention {needle}"
    );
}

#[test]
fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_file(&dir.path().join("absent.toml")).expect("defaults");
    assert_eq!(cfg.monitor.poll_ms, 200);
}

#[test]
fn invalid_file_is_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "[monitor]\npoll_ms = \"soon\"").unwrap();
    let err = load_file(&path).expect_err("type error");
    assert!(format!("{err}").contains("bad.toml"));
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/soiling.toml");
    let cfg = load_file(&path).expect("sample config loads");
    assert_eq!(cfg.serial.baud, DEFAULT_BAUD);
    assert_eq!(cfg.monitor.disconnect_grace_ms, 1250);
    assert_eq!(cfg.calibration.path, std::path::PathBuf::from("calibration.json"));
}
