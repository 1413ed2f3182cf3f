//! Concurrency tests for the homecare binary.
//!
//! Several processes share one data directory. The booking store lock must
//! serialize their read-modify-write cycles so that no booking is lost and no
//! slot is handed out twice.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("homecare").expect("Failed to find homecare binary");
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn setup_logged_in_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    cli(temp_dir.path())
        .args(["login", "--email", "ahmed@example.com", "--password", "123456"])
        .assert()
        .success();
    temp_dir
}

fn spawn_booking(data_dir: PathBuf, time: &'static str) -> thread::JoinHandle<bool> {
    thread::spawn(move || {
        let output = cli(&data_dir)
            .args([
                "book",
                "--service",
                "3",
                "--provider",
                "1",
                "--date",
                "tomorrow",
                "--time",
                time,
                "--address",
                "حي العليا، الرياض",
            ])
            .timeout(Duration::from_secs(10))
            .output()
            .expect("Failed to run homecare");
        output.status.success()
    })
}

fn stored_bookings(data_dir: &Path) -> Vec<serde_json::Value> {
    let raw = fs::read_to_string(data_dir.join("healthApp_bookings.json"))
        .expect("Failed to read booking store");
    serde_json::from_str(&raw).expect("Booking store should stay valid JSON")
}

#[test]
fn test_concurrent_bookings_on_distinct_slots_all_persist() {
    let temp_dir = setup_logged_in_dir();
    let slots = ["09:00", "09:30", "10:00", "10:30", "11:30", "12:00"];

    let handles: Vec<_> = slots
        .iter()
        .map(|slot| spawn_booking(temp_dir.path().to_path_buf(), slot))
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap(), "every distinct slot should book");
    }

    let bookings = stored_bookings(temp_dir.path());
    assert_eq!(bookings.len(), slots.len());

    let mut times: Vec<_> = bookings
        .iter()
        .map(|b| b["scheduledTime"].as_str().unwrap().to_string())
        .collect();
    times.sort();
    assert_eq!(times, slots);
}

#[test]
fn test_concurrent_bookings_on_same_slot_only_one_wins() {
    let temp_dir = setup_logged_in_dir();

    let handles: Vec<_> = (0..5)
        .map(|_| spawn_booking(temp_dir.path().to_path_buf(), "11:00"))
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);

    assert_eq!(stored_bookings(temp_dir.path()).len(), 1);
}

#[test]
fn test_concurrent_status_updates_keep_store_consistent() {
    let temp_dir = setup_logged_in_dir();
    for time in ["14:00", "14:30", "15:00"] {
        cli(temp_dir.path())
            .args([
                "book",
                "--service",
                "1",
                "--provider",
                "1",
                "--date",
                "tomorrow",
                "--time",
                time,
                "--address",
                "شارع الملك فهد",
            ])
            .assert()
            .success();
    }

    let ids: Vec<String> = stored_bookings(temp_dir.path())
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let data_dir = temp_dir.path().to_path_buf();
            thread::spawn(move || {
                cli(&data_dir)
                    .args(["status", &id, "cancelled"])
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let bookings = stored_bookings(temp_dir.path());
    assert_eq!(bookings.len(), 3);
    assert!(bookings.iter().all(|b| b["status"] == "cancelled"));
}
