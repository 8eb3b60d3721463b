//! End-to-end waveform extraction against real decoded audio
//!
//! These tests shell out to ffmpeg and skip themselves when the media
//! tools are not installed.

use std::time::Duration;

use loopcast_test_utils::{media_tools_available, temp_upload_root, write_sine_wav};
use loopcast_worker::jobs::waveform::{extract_envelope, ENVELOPE_LEN};

const TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::test]
async fn test_envelope_of_real_wav() {
    if !media_tools_available() {
        eprintln!("skipping: ffmpeg not installed");
        return;
    }

    let root = temp_upload_root();
    let path = root.path().join("originals/tone.wav");
    write_sine_wav(&path, 10.0, 44100, 440.0).unwrap();

    let envelope = extract_envelope(&path, TIMEOUT).await;

    assert_eq!(envelope.len(), ENVELOPE_LEN);
    assert!(envelope.iter().all(|v| (0.0..=1.0).contains(v)));
    // A steady tone should produce a consistently loud envelope, nothing
    // close to silence and nothing resembling the 0.5 flat fallback
    assert!(envelope.iter().all(|v| *v > 0.2));
    let spread = envelope
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    assert!(spread.1 - spread.0 < 0.5, "tone envelope unexpectedly uneven");
}

#[tokio::test]
async fn test_unreadable_input_degrades_to_flat_fallback() {
    if !media_tools_available() {
        eprintln!("skipping: ffmpeg not installed");
        return;
    }

    let root = temp_upload_root();
    let path = root.path().join("originals/garbage.wav");
    std::fs::write(&path, b"this is not audio data at all").unwrap();

    let envelope = extract_envelope(&path, TIMEOUT).await;

    assert_eq!(envelope.len(), ENVELOPE_LEN);
    assert!(envelope.iter().all(|v| *v == 0.5));
}

#[tokio::test]
async fn test_extraction_is_deterministic() {
    if !media_tools_available() {
        eprintln!("skipping: ffmpeg not installed");
        return;
    }

    let root = temp_upload_root();
    let path = root.path().join("originals/tone.wav");
    write_sine_wav(&path, 3.0, 44100, 330.0).unwrap();

    let first = extract_envelope(&path, TIMEOUT).await;
    let second = extract_envelope(&path, TIMEOUT).await;

    assert_eq!(first, second);
}
