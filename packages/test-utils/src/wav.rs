//! Minimal PCM WAV synthesis
//!
//! Generates standard 44-byte-header, 16-bit mono WAV data entirely in
//! memory. Enough for pipeline fixtures; not a general WAV writer.

/// Render a sine wave as a complete WAV file
///
/// `amplitude` is linear in [0, 1]. Output is deterministic for equal
/// arguments.
pub fn sine_wav_bytes(
    duration_secs: f32,
    sample_rate: u32,
    frequency_hz: f32,
    amplitude: f32,
) -> Vec<u8> {
    let total_samples = (duration_secs * sample_rate as f32) as u32;
    let data_len = total_samples * 2;

    let mut out = Vec::with_capacity(44 + data_len as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk: PCM, mono, 16-bit
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    let scale = amplitude.clamp(0.0, 1.0) * i16::MAX as f32;
    for i in 0..total_samples {
        let t = i as f32 / sample_rate as f32;
        let value = ((2.0 * std::f32::consts::PI * frequency_hz * t).sin() * scale) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let bytes = sine_wav_bytes(1.0, 8000, 440.0, 0.8);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");
        // 1 second of mono 16-bit at 8 kHz
        assert_eq!(bytes.len(), 44 + 8000 * 2);
    }

    #[test]
    fn test_deterministic_output() {
        let a = sine_wav_bytes(0.5, 8000, 220.0, 0.5);
        let b = sine_wav_bytes(0.5, 8000, 220.0, 0.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_amplitude_bounds_respected() {
        let bytes = sine_wav_bytes(0.1, 8000, 440.0, 1.0);
        let samples: Vec<i16> = bytes[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert!(samples.iter().any(|s| *s != 0));
        assert!(samples.iter().all(|s| *s > i16::MIN));
    }
}
