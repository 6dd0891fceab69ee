use std::process::Command;

use postfeed_tui::session::TOKEN_KEY;
use postfeed_tui::storage::{KeyValue, Options, Store};

#[test]
fn prints_version() {
    let exe = env!("CARGO_BIN_EXE_postfeed-tui");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run postfeed-tui --version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.starts_with("Post Feed "), "stdout was: {}", stdout.trim());
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "stdout was: {}",
        stdout.trim()
    );
}

#[test]
fn prints_help() {
    let exe = env!("CARGO_BIN_EXE_postfeed-tui");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("run postfeed-tui --help");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.contains("Post Feed"));
    assert!(stdout.contains("--version"));
    assert!(stdout.contains("--logout"));
}

#[test]
fn logout_flag_clears_saved_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("state.db");
    {
        let store = Store::open(Options {
            path: Some(db.clone()),
        })
        .expect("open store");
        store.set(TOKEN_KEY, "jwt-abc").expect("seed token");
        store.close().expect("close store");
    }

    let run_logout = || {
        assert_cmd::Command::new(env!("CARGO_BIN_EXE_postfeed-tui"))
            .arg("--logout")
            .env("POSTFEED_STORAGE__PATH", &db)
            .env("POSTFEED_LOG__FILE", dir.path().join("postfeed.log"))
            .env("XDG_CONFIG_HOME", dir.path())
            .assert()
            .success()
    };

    run_logout().stdout(predicates::str::contains("Signed out."));
    let store = Store::open(Options {
        path: Some(db.clone()),
    })
    .expect("reopen store");
    assert_eq!(store.get(TOKEN_KEY).expect("read token"), None);
    drop(store);

    run_logout().stdout(predicates::str::contains("No saved session."));
}
