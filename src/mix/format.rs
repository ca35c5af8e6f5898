//! Container checks and per-format encoder arguments.

use std::path::Path;

/// True when `path` is a `.wav` file whose RIFF/WAVE header hound accepts.
///
/// Anything else (compressed audio, WAV with an exotic codec) is converted
/// before mixing.
pub fn is_native_wav(path: &Path) -> bool {
    has_extension(path, "wav") && hound::WavReader::open(path).is_ok()
}

/// Encoder arguments for the final export, chosen by output extension.
///
/// Extensions not listed here get the engine's default codec.
pub fn encoder_args(output: &Path) -> Vec<String> {
    if has_extension(output, "mp3") {
        ["-codec:a", "libmp3lame", "-q:a", "2"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        Vec::new()
    }
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..800 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_native_wav() {
        let dir = tempdir().unwrap();
        let wav = dir.path().join("take.WAV");
        write_wav(&wav);
        assert!(is_native_wav(&wav));
    }

    #[test]
    fn test_wav_extension_without_header() {
        let dir = tempdir().unwrap();
        let fake = dir.path().join("fake.wav");
        fs::write(&fake, b"ID3\x03not really audio").unwrap();
        assert!(!is_native_wav(&fake));
    }

    #[test]
    fn test_header_without_extension() {
        let dir = tempdir().unwrap();
        let wav = dir.path().join("take.webm");
        write_wav(&wav);
        assert!(!is_native_wav(&wav));
    }

    #[test]
    fn test_encoder_args() {
        assert_eq!(
            encoder_args(Path::new("final.mp3")),
            vec!["-codec:a", "libmp3lame", "-q:a", "2"]
        );
        assert!(encoder_args(Path::new("final.flac")).is_empty());
    }
}
