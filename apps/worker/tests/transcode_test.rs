//! Preview transcoding against real files

use std::time::Duration;

use loopcast_test_utils::{media_tools_available, temp_upload_root, write_sine_wav};
use loopcast_worker::error::WorkerError;
use loopcast_worker::jobs::transcode::transcode_preview;

const TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::test]
async fn test_preview_file_is_produced() {
    if !media_tools_available() {
        eprintln!("skipping: ffmpeg not installed");
        return;
    }

    let root = temp_upload_root();
    let input = root.path().join("originals/tone.wav");
    let output = root.path().join("previews/tone.mp3");
    write_sine_wav(&input, 2.0, 44100, 440.0).unwrap();

    transcode_preview(&input, &output, TIMEOUT).await.unwrap();

    let metadata = std::fs::metadata(&output).unwrap();
    assert!(metadata.len() > 0, "preview file is empty");
}

#[tokio::test]
async fn test_rejected_input_is_fatal() {
    if !media_tools_available() {
        eprintln!("skipping: ffmpeg not installed");
        return;
    }

    let root = temp_upload_root();
    let input = root.path().join("originals/garbage.bin");
    let output = root.path().join("previews/garbage.mp3");
    std::fs::write(&input, b"not an audio container").unwrap();

    let err = transcode_preview(&input, &output, TIMEOUT)
        .await
        .expect_err("garbage input should not transcode");
    assert!(matches!(err, WorkerError::Transcode { .. }));
}

#[tokio::test]
async fn test_transcode_is_deterministic() {
    if !media_tools_available() {
        eprintln!("skipping: ffmpeg not installed");
        return;
    }

    let root = temp_upload_root();
    let input = root.path().join("originals/tone.wav");
    write_sine_wav(&input, 2.0, 44100, 440.0).unwrap();

    let first = root.path().join("previews/first.mp3");
    let second = root.path().join("previews/second.mp3");
    transcode_preview(&input, &first, TIMEOUT).await.unwrap();
    transcode_preview(&input, &second, TIMEOUT).await.unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap(),
        "same input must encode to identical preview bytes"
    );
}
