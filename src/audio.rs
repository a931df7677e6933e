use crate::error::AudioError;
use crate::resample;
use crate::utils::format_duration;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A decoded mono signal at its native sample rate.
///
/// # Sample Normalization
///
/// Samples are `f32` in `[-1.0, 1.0]`. Multichannel sources are averaged
/// frame by frame, so a stereo file becomes the mean of its two channels.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Mono samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 22050, 44100, 48000).
    pub sample_rate: u32,
    /// Number of channels in the source before downmixing.
    pub source_channels: usize,
}

impl AudioClip {
    /// Wrap already-decoded mono samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            source_channels: 1,
        }
    }

    /// Decode a whole audio file (WAV, MP3, FLAC, M4A/AAC, ...).
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::OpenFailed`] if the file cannot be opened,
    /// [`AudioError::Probe`] if the container is not recognized,
    /// [`AudioError::NoAudioTrack`] / [`AudioError::UnknownSampleRate`] for
    /// unusable streams, [`AudioError::Decode`] for unrecoverable decoder
    /// errors and [`AudioError::EmptyFile`] if no samples were produced.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use waveform_analysis::audio::AudioClip;
    ///
    /// let clip = AudioClip::load("real_sample.wav")?;
    /// println!("{} samples at {} Hz", clip.len(), clip.sample_rate);
    /// # Ok::<(), waveform_analysis::error::AudioError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|source| AudioError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|source| AudioError::Probe {
                path: path.to_path_buf(),
                source,
            })?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::NoAudioTrack {
                path: path.to_path_buf(),
            })?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|source| AudioError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let mut samples = Vec::new();
        let mut source_channels = 0;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                // A new track list mid-file; everything decoded so far is kept.
                Err(SymphoniaError::ResetRequired) => break,
                Err(source) => {
                    return Err(AudioError::Decode {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(reason)) => {
                    tracing::warn!(path = %path.display(), "Skipping corrupt packet: {}", reason);
                    continue;
                }
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(source) => {
                    return Err(AudioError::Decode {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count().max(1);
            source_channels = channels;
            sample_rate.get_or_insert(spec.rate);

            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            downmix_into(buf.samples(), channels, &mut samples);
        }

        let sample_rate = match sample_rate {
            Some(rate) if rate > 0 => rate,
            _ => {
                return Err(AudioError::UnknownSampleRate {
                    path: path.to_path_buf(),
                })
            }
        };

        if samples.is_empty() {
            return Err(AudioError::EmptyFile {
                path: path.to_path_buf(),
            });
        }

        let clip = Self {
            samples,
            sample_rate,
            source_channels,
        };

        tracing::info!(
            path = %path.display(),
            sample_rate,
            channels = source_channels,
            samples = clip.len(),
            duration = %format_duration(clip.duration_secs()),
            "Decoded audio file"
        );

        Ok(clip)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// The first `min(len, secs * sample_rate)` samples.
    pub fn head(&self, secs: f32) -> &[f32] {
        let wanted = (secs.max(0.0) * self.sample_rate as f32) as usize;
        &self.samples[..wanted.min(self.samples.len())]
    }

    /// A copy of this clip converted to `target_rate`.
    pub fn resampled(&self, target_rate: u32) -> Result<Self, AudioError> {
        Ok(Self {
            samples: resample::resample(&self.samples, self.sample_rate, target_rate)?,
            sample_rate: target_rate,
            source_channels: self.source_channels,
        })
    }
}

/// Average interleaved frames into mono and append them to `out`.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }

    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}
