//! Waveform envelope extraction
//!
//! Produces the fixed-length normalized amplitude sequence the frontend
//! renders instead of shipping raw audio. FFmpeg decodes the source to
//! mono f32 PCM at a reduced sample rate and streams it over stdout; the
//! sample chunks are consumed incrementally, so the decoded stream is
//! never buffered as a whole file.
//!
//! Decode failure is non-fatal: the extractor degrades to a flat placeholder
//! envelope so the loop still reaches READY with a (degenerate) visual.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::error::{WorkerError, WorkerResult};

/// Number of amplitude values in a finished envelope
pub const ENVELOPE_LEN: usize = 100;

/// Decode sample rate in Hz: enough resolution for a visual envelope,
/// never for playback
pub const DECODE_SAMPLE_RATE: u32 = 8000;

/// Amplitude used for every value of the fallback envelope
const FALLBACK_AMPLITUDE: f32 = 0.5;

/// Incremental aggregation of a raw f32le PCM stream into an envelope
///
/// Chunks may arrive with arbitrary byte boundaries; partial samples are
/// carried over to the next chunk. Samples are rectified as they arrive
/// and the running peak is tracked for the final normalization pass.
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    /// Trailing bytes of an incomplete sample from the previous chunk
    carry: Vec<u8>,
    /// Rectified samples in stream order
    samples: Vec<f32>,
    /// Largest absolute sample value seen
    peak: f32,
}

impl EnvelopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of little-endian f32 PCM bytes
    pub fn push_bytes(&mut self, chunk: &[u8]) {
        if self.carry.is_empty() {
            let rest = self.ingest(chunk);
            self.carry = rest.to_vec();
        } else {
            let mut merged = std::mem::take(&mut self.carry);
            merged.extend_from_slice(chunk);
            let rest = self.ingest(&merged).to_vec();
            self.carry = rest;
        }
    }

    /// Consume every whole sample in `data`, returning the unconsumed tail
    fn ingest<'a>(&mut self, data: &'a [u8]) -> &'a [u8] {
        let whole = data.len() - data.len() % 4;
        for bytes in data[..whole].chunks_exact(4) {
            let sample = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let magnitude = if sample.is_finite() { sample.abs() } else { 0.0 };
            if magnitude > self.peak {
                self.peak = magnitude;
            }
            self.samples.push(magnitude);
        }
        &data[whole..]
    }

    /// Number of whole samples consumed so far
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Reduce the sample stream to the normalized envelope
    ///
    /// The stream is partitioned in order into [`ENVELOPE_LEN`] windows of
    /// `floor(n / ENVELOPE_LEN)` samples (at least one) and each window is
    /// averaged, then normalized by the peak so the loudest region sits at
    /// 1.0 regardless of source loudness. A silent stream (peak zero)
    /// yields all zeros. Inputs with fewer samples than [`ENVELOPE_LEN`]
    /// produce a shorter envelope: one window per sample, no padding.
    pub fn finish(self) -> Vec<f32> {
        if self.samples.is_empty() {
            return Vec::new();
        }

        let step = (self.samples.len() / ENVELOPE_LEN).max(1);
        let mut envelope = Vec::with_capacity(ENVELOPE_LEN);

        for window in self.samples.chunks(step) {
            if envelope.len() == ENVELOPE_LEN {
                break;
            }
            let avg = window.iter().sum::<f32>() / window.len() as f32;
            envelope.push(if self.peak > 0.0 { avg / self.peak } else { 0.0 });
        }

        envelope
    }
}

/// The placeholder envelope recorded when the source cannot be decoded
pub fn fallback_envelope() -> Vec<f32> {
    vec![FALLBACK_AMPLITUDE; ENVELOPE_LEN]
}

/// Extract the waveform envelope of an audio file
///
/// Never fails: an unreadable or corrupt stream yields the flat fallback
/// envelope so the processing job can still complete.
pub async fn extract_envelope(path: &Path, timeout: Duration) -> Vec<f32> {
    match try_extract(path, timeout).await {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Waveform decode failed, using flat fallback"
            );
            fallback_envelope()
        }
    }
}

async fn try_extract(path: &Path, timeout: Duration) -> WorkerResult<Vec<f32>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-hide_banner")
        .args(["-loglevel", "error"])
        .arg("-i")
        .arg(path)
        .args(["-f", "f32le"])
        .args(["-ac", "1"])
        .args(["-ar", &DECODE_SAMPLE_RATE.to_string()])
        .arg("pipe:1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WorkerError::FfmpegNotFound
        } else {
            WorkerError::decode(path, e.to_string())
        }
    })?;

    // Surface decoder diagnostics without tying them to the job outcome
    if let Some(stderr) = child.stderr.take() {
        let path_str = path.display().to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::warn!(target: "ffmpeg", path = %path_str, "{}", line);
            }
        });
    }

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| WorkerError::Internal("ffmpeg stdout not captured".into()))?;

    let decode = async {
        let mut builder = EnvelopeBuilder::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = stdout.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            builder.push_bytes(&buf[..n]);
        }
        let status = child.wait().await?;
        Ok::<_, WorkerError>((builder, status))
    };

    let (builder, status) = tokio::time::timeout(timeout, decode)
        .await
        .map_err(|_| WorkerError::Timeout {
            seconds: timeout.as_secs(),
        })??;

    if !status.success() {
        return Err(WorkerError::decode(
            path,
            format!("decoder exited with {}", status),
        ));
    }

    tracing::debug!(
        path = %path.display(),
        samples = builder.sample_count(),
        "Waveform decode finished"
    );

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_envelope_has_expected_length() {
        let mut builder = EnvelopeBuilder::new();
        let samples: Vec<f32> = (0..8000).map(|i| (i as f32 / 8000.0).sin()).collect();
        builder.push_bytes(&bytes_of(&samples));

        let envelope = builder.finish();
        assert_eq!(envelope.len(), ENVELOPE_LEN);
        assert!(envelope.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_constant_signal_normalizes_to_one() {
        let mut builder = EnvelopeBuilder::new();
        builder.push_bytes(&bytes_of(&[0.25; 1000]));

        let envelope = builder.finish();
        assert_eq!(envelope.len(), ENVELOPE_LEN);
        for value in envelope {
            assert!((value - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_loudest_window_dominates() {
        // 100 windows of 10 samples; window 40 holds the only loud region
        let mut samples = vec![0.1_f32; 1000];
        for s in samples.iter_mut().skip(400).take(10) {
            *s = 0.8;
        }
        let mut builder = EnvelopeBuilder::new();
        builder.push_bytes(&bytes_of(&samples));

        let envelope = builder.finish();
        assert_eq!(envelope.len(), ENVELOPE_LEN);
        assert!((envelope[40] - 1.0).abs() < 1e-6);
        for (i, value) in envelope.iter().enumerate() {
            if i != 40 {
                assert!(*value < 0.2, "window {} unexpectedly loud: {}", i, value);
            }
        }
    }

    #[test]
    fn test_silent_signal_yields_zeros() {
        let mut builder = EnvelopeBuilder::new();
        builder.push_bytes(&bytes_of(&[0.0; 500]));

        let envelope = builder.finish();
        assert_eq!(envelope.len(), ENVELOPE_LEN);
        assert!(envelope.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_negative_samples_are_rectified() {
        let mut builder = EnvelopeBuilder::new();
        builder.push_bytes(&bytes_of(&[-0.5; 200]));

        let envelope = builder.finish();
        for value in envelope {
            assert!((value - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_chunk_boundary_carry() {
        // Split the byte stream at positions that do not align to samples
        let samples: Vec<f32> = (0..640).map(|i| (i % 7) as f32 / 7.0).collect();
        let bytes = bytes_of(&samples);

        let mut aligned = EnvelopeBuilder::new();
        aligned.push_bytes(&bytes);

        let mut ragged = EnvelopeBuilder::new();
        for chunk in bytes.chunks(13) {
            ragged.push_bytes(chunk);
        }

        assert_eq!(aligned.sample_count(), ragged.sample_count());
        assert_eq!(aligned.finish(), ragged.finish());
    }

    #[test]
    fn test_short_input_produces_short_envelope() {
        let mut builder = EnvelopeBuilder::new();
        builder.push_bytes(&bytes_of(&[0.3; 42]));

        let envelope = builder.finish();
        assert_eq!(envelope.len(), 42);
    }

    #[test]
    fn test_empty_input_produces_empty_envelope() {
        let builder = EnvelopeBuilder::new();
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn test_non_finite_samples_treated_as_silence() {
        let mut builder = EnvelopeBuilder::new();
        builder.push_bytes(&bytes_of(&[f32::NAN, f32::INFINITY, 0.5, 0.5]));

        let envelope = builder.finish();
        assert_eq!(envelope, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_fallback_envelope_shape() {
        let envelope = fallback_envelope();
        assert_eq!(envelope.len(), ENVELOPE_LEN);
        assert!(envelope.iter().all(|v| *v == 0.5));
    }

    #[test]
    fn test_determinism() {
        let samples: Vec<f32> = (0..4321).map(|i| ((i * 31) % 97) as f32 / 97.0).collect();
        let bytes = bytes_of(&samples);

        let mut first = EnvelopeBuilder::new();
        first.push_bytes(&bytes);
        let mut second = EnvelopeBuilder::new();
        second.push_bytes(&bytes);

        assert_eq!(first.finish(), second.finish());
    }
}
