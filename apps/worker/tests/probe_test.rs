//! Duration probing against real files

use std::path::Path;
use std::time::Duration;

use loopcast_test_utils::{media_tools_available, temp_upload_root, write_sine_wav};
use loopcast_worker::jobs::probe::probe_duration;

const TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
async fn test_probe_reports_true_duration() {
    if !media_tools_available() {
        eprintln!("skipping: ffprobe not installed");
        return;
    }

    let root = temp_upload_root();
    let path = root.path().join("originals/ten-seconds.wav");
    write_sine_wav(&path, 10.0, 44100, 440.0).unwrap();

    let duration = probe_duration(&path, TIMEOUT).await.expect("probe failed");
    assert!((duration - 10.0).abs() < 0.5, "got {}", duration);
}

#[tokio::test]
async fn test_probe_of_corrupt_file_is_none() {
    if !media_tools_available() {
        eprintln!("skipping: ffprobe not installed");
        return;
    }

    let root = temp_upload_root();
    let path = root.path().join("originals/corrupt.wav");
    std::fs::write(&path, b"definitely not a container").unwrap();

    assert_eq!(probe_duration(&path, TIMEOUT).await, None);
}

#[tokio::test]
async fn test_probe_of_missing_file_is_none() {
    // Holds whether or not ffprobe is installed: a missing tool and a
    // missing file both degrade to the unknown sentinel
    assert_eq!(
        probe_duration(Path::new("/nonexistent/file.wav"), TIMEOUT).await,
        None
    );
}
