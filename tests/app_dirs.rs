mod support;

use freight_pricing::app_dirs::{APP_DIR_NAME, app_root_dir, logs_dir};
use support::home_env::HomeEnvGuard;
use tempfile::tempdir;

#[test]
fn home_override_controls_app_and_log_dirs() {
    let base = tempdir().unwrap();
    let _guard = HomeEnvGuard::set(base.path());

    let root = app_root_dir().unwrap();
    assert_eq!(root, base.path().join(APP_DIR_NAME));
    assert!(root.is_dir());

    let logs = logs_dir().unwrap();
    assert_eq!(logs, root.join("logs"));
    assert!(logs.is_dir());
}
