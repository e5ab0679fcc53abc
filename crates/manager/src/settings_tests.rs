// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn poker_period_is_0_45_of_cooldown() {
    let settings = Settings {
        admin_socket_path: PathBuf::from("/tmp/a.sock"),
        artifact_root: PathBuf::from("/tmp/vcl"),
        worker_command: None,
        worker_args: Vec::new(),
        cooldown_window: Duration::from_secs(100),
        log_dir: None,
        boot_config: None,
    };
    assert_eq!(settings.poker_period(), Duration::from_secs_f64(45.0));
}
