// Drives the compiled binary's headless subcommands against a temp database.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

fn faster(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("faster").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_STATE_HOME", home.path().join("state"));
    cmd
}

#[test]
fn add_record_and_report_stats() {
    let home = tempdir().unwrap();
    let db = home.path().join("timers.db");
    let db = db.to_str().unwrap();

    faster(&home)
        .args(["--db", db, "list"])
        .assert()
        .success()
        .stdout("no timers\n");

    faster(&home)
        .args(["--db", db, "add", "Laundry"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("created Laundry"));

    for secs in ["10", "20"] {
        faster(&home)
            .args(["--db", db, "record", "Laundry", secs])
            .assert()
            .success();
    }

    faster(&home)
        .args(["--db", db, "stats", "Laundry", "--range", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("runs\t2"))
        .stdout(predicate::str::contains("average\t15.0 s"))
        .stdout(predicate::str::contains("fastest\t10.0 s"));

    faster(&home)
        .args(["--db", db, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Laundry").and(predicate::str::contains("2 records")));
}

#[test]
fn unknown_timer_fails() {
    let home = tempdir().unwrap();
    let db = home.path().join("timers.db");

    faster(&home)
        .args(["--db", db.to_str().unwrap(), "record", "nope", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no timer named"));
}

#[test]
fn in_memory_store_keeps_nothing() {
    let home = tempdir().unwrap();

    faster(&home)
        .args(["--in-memory", "add", "Scratch"])
        .assert()
        .success();
    faster(&home)
        .args(["--in-memory", "list"])
        .assert()
        .success()
        .stdout("no timers\n");
}
