use std::fs;
use std::path::Path;

use crate::recorder;

/// Audio file extensions the Voice Vault API accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["wav", "mp3", "flac", "m4a", "aac", "ogg"];

/// Where a capture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Recording,
    Upload,
}

/// One finalized audio clip, recorded or uploaded, held in memory until
/// it is submitted, replaced, or reset.
#[derive(Debug, Clone)]
pub struct Capture {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub source: CaptureSource,
    /// Seconds, when derivable (recorded clips always; WAV uploads probed).
    pub duration_secs: Option<f64>,
    /// Name sent as the multipart file name and shown in the UI.
    pub file_name: String,
}

impl Capture {
    /// Build a capture from recorded samples by encoding them as WAV.
    pub fn from_recording(
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = recorder::samples_to_wav(samples, sample_rate)?;
        Ok(Self {
            bytes,
            mime: "audio/wav".into(),
            source: CaptureSource::Recording,
            duration_secs: Some(samples.len() as f64 / sample_rate as f64),
            file_name: "recording.wav".into(),
        })
    }

    /// Build a capture from an audio file on disk. Returns `None` if the
    /// file is not a supported audio type, leaving caller state unchanged.
    pub fn from_file(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let mime = mime_for_file(&file_name)?;

        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Failed to read {}: {e}", path.display());
                return None;
            }
        };

        let duration_secs = probe_wav_duration(&bytes);
        Some(Self {
            bytes,
            mime,
            source: CaptureSource::Upload,
            duration_secs,
            file_name,
        })
    }
}

/// Controller invariant: at most one live clip. Installing a new capture
/// drops the previous one first.
#[derive(Default)]
pub struct CaptureController {
    current: Option<Capture>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a finalized capture, releasing any previous clip.
    pub fn install(&mut self, capture: Capture) {
        if let Some(old) = self.current.take() {
            log::debug!("Releasing previous capture '{}'", old.file_name);
            drop(old);
        }
        self.current = Some(capture);
    }

    /// Drop the active clip, returning to the empty state.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Capture> {
        self.current.as_ref()
    }

    pub fn has_capture(&self) -> bool {
        self.current.is_some()
    }
}

/// Check a file name against the supported audio extensions.
pub fn is_supported_audio_file(file_name: &str) -> bool {
    mime_for_file(file_name).is_some()
}

/// ".wav, .mp3, ..." for user-facing validation messages.
pub fn supported_formats_label() -> String {
    SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// MIME type for a supported audio file name, `None` otherwise. Only types
/// with an `audio/` prefix are ever produced, so the prefix check the
/// upload path relies on is implied.
fn mime_for_file(file_name: &str) -> Option<String> {
    let ext = file_name.rsplit('.').next()?.to_ascii_lowercase();
    if file_name.len() == ext.len() {
        // No '.' separator at all
        return None;
    }
    let mime = match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        _ => return None,
    };
    Some(mime.into())
}

/// Duration of a WAV payload in seconds, if it parses as WAV.
fn probe_wav_duration(bytes: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(reader.duration() as f64 / spec.sample_rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_supported_extensions() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(
                is_supported_audio_file(&format!("clip.{ext}")),
                "expected .{ext} to be accepted"
            );
        }
        // Extension matching is case-insensitive
        assert!(is_supported_audio_file("CLIP.WAV"));
    }

    #[test]
    fn rejects_non_audio_files() {
        for name in ["notes.txt", "movie.mp4", "archive.tar.gz", "wav", "noext"] {
            assert!(!is_supported_audio_file(name), "expected {name} rejected");
        }
    }

    #[test]
    fn rejected_file_leaves_controller_unchanged() {
        let mut controller = CaptureController::new();
        let clip = Capture::from_recording(&[0.0; 1600], 16_000).unwrap();
        controller.install(clip);

        // A bogus path never produces a capture, so there is nothing to install.
        assert!(Capture::from_file(Path::new("/nonexistent/slides.pdf")).is_none());
        assert!(controller.has_capture());
        assert_eq!(controller.current().unwrap().file_name, "recording.wav");
    }

    #[test]
    fn install_replaces_previous_clip() {
        let mut controller = CaptureController::new();
        controller.install(Capture::from_recording(&[0.0; 1600], 16_000).unwrap());

        let second = Capture {
            bytes: vec![1, 2, 3],
            mime: "audio/mpeg".into(),
            source: CaptureSource::Upload,
            duration_secs: None,
            file_name: "sample.mp3".into(),
        };
        controller.install(second);

        let current = controller.current().unwrap();
        assert_eq!(current.file_name, "sample.mp3");
        assert_eq!(current.source, CaptureSource::Upload);
    }

    #[test]
    fn recording_duration_derives_from_sample_count() {
        let capture = Capture::from_recording(&[0.0; 32_000], 16_000).unwrap();
        assert_eq!(capture.duration_secs, Some(2.0));
        assert_eq!(capture.mime, "audio/wav");
        assert_eq!(capture.source, CaptureSource::Recording);
    }

    #[test]
    fn wav_upload_duration_is_probed() {
        let bytes = crate::recorder::samples_to_wav(&[0.0; 8000], 16_000).unwrap();
        assert_eq!(probe_wav_duration(&bytes), Some(0.5));
        assert_eq!(probe_wav_duration(b"not a wav"), None);
    }

    #[test]
    fn reset_clears_active_clip() {
        let mut controller = CaptureController::new();
        controller.install(Capture::from_recording(&[0.0; 1600], 16_000).unwrap());
        controller.reset();
        assert!(!controller.has_capture());
    }
}
