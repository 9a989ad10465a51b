use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

/// Errors from local clip playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no audio output device found")]
    NoDevice,

    /// Only WAV clips can be decoded locally; other upload formats are
    /// submitted to the API as-is but cannot be previewed.
    #[error("cannot play this clip locally ({0})")]
    UnsupportedFormat(String),

    #[error("output config error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("output stream error: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("playback error: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("pause error: {0}")]
    Pause(#[from] cpal::PauseStreamError),
}

struct PlaybackShared {
    samples: Vec<f32>,
    sample_rate: u32,
    /// Output-frame cursor, advanced by the stream callback.
    cursor: AtomicUsize,
    finished: AtomicBool,
}

/// Plays one decoded clip through the default output device.
///
/// Two-state toggle (playing/paused); reaching the end of the clip parks
/// the player back at paused-at-start. Loading a new clip drops the
/// previous stream and samples.
#[derive(Default)]
pub struct ClipPlayer {
    stream: Option<cpal::Stream>,
    shared: Option<Arc<PlaybackShared>>,
    playing: bool,
}

impl ClipPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a WAV payload and make it the active clip. Any previous clip
    /// and its output stream are released first.
    pub fn load(&mut self, wav_bytes: &[u8]) -> Result<(), PlaybackError> {
        self.unload();
        let (samples, sample_rate) = decode_wav(wav_bytes)?;
        self.shared = Some(Arc::new(PlaybackShared {
            samples,
            sample_rate,
            cursor: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        }));
        Ok(())
    }

    /// Drop the active clip and stream.
    pub fn unload(&mut self) {
        self.stream = None;
        self.shared = None;
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_clip(&self) -> bool {
        self.shared.is_some()
    }

    /// Start or resume playback of the loaded clip.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let shared = self
            .shared
            .as_ref()
            .ok_or_else(|| PlaybackError::UnsupportedFormat("no clip loaded".into()))?
            .clone();

        if self.stream.is_none() {
            self.stream = Some(build_output_stream(shared)?);
        }
        if let Some(ref stream) = self.stream {
            stream.play()?;
        }
        self.playing = true;
        Ok(())
    }

    /// Pause playback, keeping the cursor where it is.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if let Some(ref stream) = self.stream {
            stream.pause()?;
        }
        self.playing = false;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), PlaybackError> {
        if self.playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Poll for natural end of playback. When the clip has run out this
    /// returns true once, after parking the player at paused-at-start.
    pub fn take_finished(&mut self) -> bool {
        let finished = self
            .shared
            .as_ref()
            .map(|s| s.finished.swap(false, Ordering::Relaxed))
            .unwrap_or(false);
        if finished {
            if let Some(ref shared) = self.shared {
                shared.cursor.store(0, Ordering::Relaxed);
            }
            // Tear down the stream so the next play starts clean.
            self.stream = None;
            self.playing = false;
        }
        finished
    }
}

fn build_output_stream(shared: Arc<PlaybackShared>) -> Result<cpal::Stream, PlaybackError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
    let config = device.default_output_config()?;
    let out_rate = config.sample_rate() as u64;
    let channels = config.channels() as usize;
    let src_rate = shared.sample_rate as u64;

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let mut out_pos = shared.cursor.load(Ordering::Relaxed);
            let total = shared.samples.len() as u64;
            for frame in data.chunks_mut(channels) {
                // Nearest-sample rate conversion; fine for voice preview.
                let src_idx = out_pos as u64 * src_rate / out_rate.max(1);
                let value = if src_idx < total {
                    shared.samples[src_idx as usize]
                } else {
                    shared.finished.store(true, Ordering::Relaxed);
                    0.0
                };
                for sample in frame.iter_mut() {
                    *sample = value;
                }
                out_pos += 1;
            }
            shared.cursor.store(out_pos, Ordering::Relaxed);
        },
        |err| log::error!("Audio output error: {err}"),
        None,
    )?;

    Ok(stream)
}

/// Decode WAV bytes to mono f32 samples plus their sample rate.
fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32), PlaybackError> {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(bytes))
        .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()
                .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?
        }
    };

    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mono_pcm_wav() {
        let bytes = crate::recorder::samples_to_wav(&[0.0, 0.5, -0.5], 16_000).unwrap();
        let (samples, rate) = decode_wav(&bytes).unwrap();
        assert_eq!(rate, 16_000);
        assert_eq!(samples.len(), 3);
        assert!((samples[1] - 0.5).abs() < 0.001);
    }

    #[test]
    fn downmixes_stereo_to_mono() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(i16::MAX).unwrap();
            writer.write_sample(-i16::MAX).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, rate) = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(rate, 44_100);
        assert_eq!(samples.len(), 4);
        for s in samples {
            assert!(s.abs() < 0.001, "L/R should cancel, got {s}");
        }
    }

    #[test]
    fn non_wav_bytes_are_unsupported() {
        let err = decode_wav(b"ID3\x04mp3-ish").unwrap_err();
        assert!(matches!(err, PlaybackError::UnsupportedFormat(_)));
    }
}
