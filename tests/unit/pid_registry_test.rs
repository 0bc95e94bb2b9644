use havenbrowser::services::pid_registry::{PidRegistry, PidRegistryTrait};
use havenbrowser::types::process::ProcessKind;
use rstest::rstest;

/// A positive pid far above any real pid table, guaranteed dead.
const DEAD_PID: u32 = 999_999_999;

fn temp_registry() -> (tempfile::TempDir, PidRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = PidRegistry::new(dir.path().to_path_buf());
    (dir, registry)
}

#[rstest]
#[case(ProcessKind::Main, "browser.pid")]
#[case(ProcessKind::Watchdog, "watchdog.pid")]
fn test_record_path_uses_role_file_name(#[case] kind: ProcessKind, #[case] name: &str) {
    let (_dir, registry) = temp_registry();
    assert_eq!(registry.record_path(kind).file_name().unwrap(), name);
}

#[test]
fn test_write_then_read_roundtrip() {
    let (_dir, registry) = temp_registry();
    registry.write_record(ProcessKind::Main, 4242);
    let record = registry.read_record(ProcessKind::Main).unwrap();
    assert_eq!(record.pid, 4242);
    assert_eq!(record.kind, ProcessKind::Main);
}

#[test]
fn test_record_is_plain_decimal_text() {
    let (dir, registry) = temp_registry();
    registry.write_record(ProcessKind::Watchdog, 1337);
    let content = std::fs::read_to_string(dir.path().join("watchdog.pid")).unwrap();
    assert_eq!(content, "1337");
}

#[test]
fn test_write_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let registry = PidRegistry::new(dir.path().join("nested").join("deeper"));
    registry.write_record(ProcessKind::Main, 1);
    assert!(registry.record_path(ProcessKind::Main).exists());
}

#[test]
fn test_write_failure_does_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    // Parent "directory" is a regular file; the write fails and is swallowed.
    let registry = PidRegistry::new(blocker.join("sub"));
    registry.write_record(ProcessKind::Main, 1);
    assert!(registry.read_record(ProcessKind::Main).is_none());
}

#[test]
fn test_read_missing_record_returns_none() {
    let (_dir, registry) = temp_registry();
    assert!(registry.read_record(ProcessKind::Main).is_none());
}

#[test]
fn test_read_unparsable_record_returns_none() {
    let (dir, registry) = temp_registry();
    std::fs::write(dir.path().join("browser.pid"), "not-a-pid").unwrap();
    assert!(registry.read_record(ProcessKind::Main).is_none());
}

#[test]
fn test_read_tolerates_surrounding_whitespace() {
    let (dir, registry) = temp_registry();
    std::fs::write(dir.path().join("browser.pid"), " 555\n").unwrap();
    assert_eq!(registry.read_record(ProcessKind::Main).unwrap().pid, 555);
}

#[test]
fn test_own_pid_is_alive() {
    let (_dir, registry) = temp_registry();
    assert!(registry.is_alive(std::process::id()));
}

#[test]
fn test_dead_pid_is_not_alive() {
    let (_dir, registry) = temp_registry();
    assert!(!registry.is_alive(DEAD_PID));
}

#[test]
fn test_own_record_is_not_a_peer() {
    let (_dir, registry) = temp_registry();
    registry.write_record(ProcessKind::Main, std::process::id());
    assert!(!registry.is_peer_running(ProcessKind::Main));
}

#[test]
fn test_dead_record_is_cleaned_up_and_not_a_peer() {
    let (_dir, registry) = temp_registry();
    registry.write_record(ProcessKind::Main, DEAD_PID);
    assert!(!registry.is_peer_running(ProcessKind::Main));
    // The stale record was deleted so a fresh instance can claim the role.
    assert!(registry.read_record(ProcessKind::Main).is_none());
}

#[test]
fn test_missing_record_is_not_a_peer() {
    let (_dir, registry) = temp_registry();
    assert!(!registry.is_peer_running(ProcessKind::Watchdog));
}

#[cfg(unix)]
#[test]
fn test_live_foreign_pid_is_a_peer() {
    let (_dir, registry) = temp_registry();
    let mut child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("failed to spawn sleep");

    registry.write_record(ProcessKind::Main, child.id());
    assert!(registry.is_peer_running(ProcessKind::Main));
    // A live peer's record must survive the check.
    assert!(registry.read_record(ProcessKind::Main).is_some());

    child.kill().unwrap();
    child.wait().unwrap();
    assert!(!registry.is_peer_running(ProcessKind::Main));
}

#[test]
fn test_delete_record_removes_file() {
    let (_dir, registry) = temp_registry();
    registry.write_record(ProcessKind::Watchdog, 99);
    registry.delete_record(ProcessKind::Watchdog);
    assert!(registry.read_record(ProcessKind::Watchdog).is_none());
}

#[test]
fn test_delete_missing_record_is_a_no_op() {
    let (_dir, registry) = temp_registry();
    registry.delete_record(ProcessKind::Main);
}

#[test]
fn test_roles_do_not_share_records() {
    let (_dir, registry) = temp_registry();
    registry.write_record(ProcessKind::Main, 10);
    registry.write_record(ProcessKind::Watchdog, 20);
    assert_eq!(registry.read_record(ProcessKind::Main).unwrap().pid, 10);
    assert_eq!(registry.read_record(ProcessKind::Watchdog).unwrap().pid, 20);
    registry.delete_record(ProcessKind::Main);
    assert!(registry.read_record(ProcessKind::Watchdog).is_some());
}
