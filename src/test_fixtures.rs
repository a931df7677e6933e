//! Synthetic audio test fixtures for development and testing
//!
//! Deterministic signals with known properties, plus helpers that lay them out
//! as small labelled datasets on disk, so tests never depend on binary audio
//! files in the repository.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Generate a pure sine wave at the given frequency
///
/// # Example
/// ```
/// use waveform_analysis::test_fixtures::generate_sine_wave;
/// // 1 second of A4 (440Hz) at half volume
/// let tone = generate_sine_wave(440.0, 1.0, 44100, 0.5);
/// assert_eq!(tone.len(), 44100);
/// ```
pub fn generate_sine_wave(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    amplitude: f32,
) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Generate pseudo-random white noise
///
/// Deterministic noise based on sample index for reproducible tests.
pub fn generate_white_noise(duration_secs: f32, sample_rate: u32, amplitude: f32) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let num_samples = (duration_secs * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let mut hasher = DefaultHasher::new();
            i.hash(&mut hasher);
            let hash = hasher.finish();
            let normalized = ((hash % 2000) as f32 / 1000.0) - 1.0;
            amplitude * normalized
        })
        .collect()
}

/// A voice-like test signal: a 150 Hz fundamental with two harmonics under a
/// slow amplitude envelope.
pub fn generate_voiced_tone(duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let envelope = 0.5 + 0.5 * (2.0 * PI * 2.0 * t).sin().abs();
            let tone = (2.0 * PI * 150.0 * t).sin()
                + 0.5 * (2.0 * PI * 300.0 * t).sin()
                + 0.25 * (2.0 * PI * 450.0 * t).sin();
            0.4 * envelope * tone / 1.75
        })
        .collect()
}

/// Write interleaved `f32` samples as a 16-bit PCM WAV file.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()
}

/// Samples per FLAC frame written by [`write_flac`].
pub const FLAC_BLOCK_SIZE: usize = 4096;

/// Samples decoded from each frame written by [`write_silent_mp3`].
pub const MP3_FRAME_SAMPLES: usize = 1152;

/// Write mono `f32` samples as a 16-bit FLAC stream.
///
/// Frames hold verbatim (uncompressed) subframes of [`FLAC_BLOCK_SIZE`]
/// samples; header and frame checksums are real, so any conforming decoder
/// accepts the file.
///
/// # Example
/// ```
/// use waveform_analysis::audio::AudioClip;
/// use waveform_analysis::test_fixtures::{generate_sine_wave, write_flac};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("tone.flac");
/// write_flac(&path, &generate_sine_wave(440.0, 0.5, 16000, 0.5), 16000).unwrap();
///
/// let clip = AudioClip::load(&path).unwrap();
/// assert_eq!((clip.sample_rate, clip.len()), (16000, 8000));
/// ```
pub fn write_flac<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> std::io::Result<()> {
    use symphonia::core::checksum::{Crc16Ansi, Crc8Ccitt};
    use symphonia::core::io::Monitor;

    let mut out = Vec::with_capacity(64 + samples.len() * 2);

    // Marker, then STREAMINFO as the only (last) metadata block.
    out.extend_from_slice(b"fLaC");
    out.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
    out.extend_from_slice(&(FLAC_BLOCK_SIZE as u16).to_be_bytes());
    out.extend_from_slice(&(FLAC_BLOCK_SIZE as u16).to_be_bytes());
    out.extend_from_slice(&[0; 6]); // min/max frame size unknown
    let info = (u64::from(sample_rate) << 44)
        | (15u64 << 36) // 16 bits per sample, one channel
        | (samples.len() as u64 & 0xF_FFFF_FFFF);
    out.extend_from_slice(&info.to_be_bytes());
    out.extend_from_slice(&[0; 16]); // no MD5

    let (rate_code, rate_field) = flac_rate_code(sample_rate);

    for (index, block) in samples.chunks(FLAC_BLOCK_SIZE).enumerate() {
        let start = out.len();

        // Fixed blocking, 16-bit block size field, mono, 16 bits per sample.
        out.extend_from_slice(&[0xFF, 0xF8, 0x70 | rate_code, 0x08]);
        push_utf8_number(&mut out, index as u32);
        out.extend_from_slice(&((block.len() - 1) as u16).to_be_bytes());
        if let Some(hz) = rate_field {
            out.extend_from_slice(&hz.to_be_bytes());
        }

        let mut crc8 = Crc8Ccitt::new(0);
        crc8.process_buf_bytes(&out[start..]);
        out.push(crc8.crc());

        out.push(0x02); // verbatim subframe, no wasted bits
        for &sample in block {
            out.extend_from_slice(&to_pcm16(sample).to_be_bytes());
        }

        let mut crc16 = Crc16Ansi::new(0);
        crc16.process_buf_bytes(&out[start..]);
        out.extend_from_slice(&crc16.crc().to_be_bytes());
    }

    std::fs::write(path, out)
}

/// Write `frames` silent MPEG-1 Layer III frames: 128 kbps, 44.1 kHz, mono.
///
/// Each frame decodes to [`MP3_FRAME_SAMPLES`] zero samples.
pub fn write_silent_mp3<P: AsRef<Path>>(path: P, frames: usize) -> std::io::Result<()> {
    // 144 * 128000 / 44100, header included.
    const FRAME_LEN: usize = 417;

    let mut frame = vec![0u8; FRAME_LEN];
    frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0xC0]);
    std::fs::write(path, frame.repeat(frames))
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Frame header sample-rate code, plus the explicit rate field it needs.
fn flac_rate_code(sample_rate: u32) -> (u8, Option<u16>) {
    match sample_rate {
        8000 => (0x4, None),
        16000 => (0x5, None),
        22050 => (0x6, None),
        24000 => (0x7, None),
        32000 => (0x8, None),
        44100 => (0x9, None),
        48000 => (0xa, None),
        96000 => (0xb, None),
        hz => match u16::try_from(hz) {
            Ok(hz) => (0xd, Some(hz)),
            Err(_) => (0x0, None),
        },
    }
}

/// FLAC's UTF-8 style variable-length frame number.
fn push_utf8_number(out: &mut Vec<u8>, n: u32) {
    if n < 0x80 {
        out.push(n as u8);
        return;
    }

    let len = match n {
        0..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x1F_FFFF => 4,
        0x20_0000..=0x3FF_FFFF => 5,
        _ => 6,
    };
    let lead = (0xFF00u32 >> len) as u8;
    out.push(lead | (n >> (6 * (len - 1))) as u8);
    for i in (0..len - 1).rev() {
        out.push(0x80 | ((n >> (6 * i)) & 0x3F) as u8);
    }
}

/// Builder for a throwaway dataset directory.
///
/// ```
/// use waveform_analysis::test_fixtures::TestDataset;
///
/// let dataset = TestDataset::new()
///     .wav("real/real_sample.wav", 44100, 0.5)
///     .wav("fake/fake_sample.wav", 22050, 0.5);
/// assert!(dataset.path().join("real/real_sample.wav").is_file());
/// ```
pub struct TestDataset {
    dir: tempfile::TempDir,
}

impl TestDataset {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dataset dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn prepare(&self, relative: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dataset subdir");
        }
        path
    }

    /// Add a mono voiced-tone WAV of the given length.
    pub fn wav(self, relative: &str, sample_rate: u32, duration_secs: f32) -> Self {
        let path = self.prepare(relative);
        let samples = generate_voiced_tone(duration_secs, sample_rate);
        write_wav(&path, &samples, sample_rate, 1).expect("write fixture wav");
        self
    }

    /// Add a mono voiced-tone FLAC of the given length.
    pub fn flac(self, relative: &str, sample_rate: u32, duration_secs: f32) -> Self {
        let path = self.prepare(relative);
        let samples = generate_voiced_tone(duration_secs, sample_rate);
        write_flac(&path, &samples, sample_rate).expect("write fixture flac");
        self
    }

    /// Add a silent 44.1 kHz MP3 of `frames` MPEG frames.
    pub fn mp3(self, relative: &str, frames: usize) -> Self {
        let path = self.prepare(relative);
        write_silent_mp3(&path, frames).expect("write fixture mp3");
        self
    }

    /// Add a file with arbitrary bytes, e.g. a corrupt "audio" file.
    pub fn raw(self, relative: &str, contents: &[u8]) -> Self {
        let path = self.prepare(relative);
        std::fs::write(&path, contents).expect("write fixture file");
        self
    }
}

impl Default for TestDataset {
    fn default() -> Self {
        Self::new()
    }
}
