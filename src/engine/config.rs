//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Program looked up on `PATH` when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Program name or path of the engine binary.
pub const ENV_ENGINE_PATH: &str = "CLIPOD_FFMPEG";

/// Kill engine runs that take longer than this many seconds.
pub const ENV_ENGINE_TIMEOUT: &str = "CLIPOD_ENGINE_TIMEOUT_SECS";

/// How to find and run the engine binary.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Name searched on `PATH`.
    pub program: String,
    /// Explicit binary; takes precedence over `program`.
    pub binary_path: Option<PathBuf>,
    /// No timeout when `None`.
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            binary_path: None,
            timeout: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `CLIPOD_FFMPEG` and `CLIPOD_ENGINE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var(ENV_ENGINE_PATH) {
            config = config.program_or_path(value);
        }

        if let Ok(value) = std::env::var(ENV_ENGINE_TIMEOUT) {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
                _ => log::warn!("Ignoring {}={:?}: expected positive seconds", ENV_ENGINE_TIMEOUT, value),
            }
        }

        config
    }

    /// Treat `value` as a path when it contains a separator, else as a program name.
    pub fn program_or_path(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.contains(std::path::MAIN_SEPARATOR) || value.contains('/') {
            self.binary_path = Some(PathBuf::from(value));
        } else if !value.is_empty() {
            self.program = value;
            self.binary_path = None;
        }
        self
    }

    pub fn binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Name used in logs and error messages.
    pub fn display_name(&self) -> String {
        match &self.binary_path {
            Some(path) => path.display().to_string(),
            None => self.program.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.program, "ffmpeg");
        assert!(config.binary_path.is_none());
        assert!(config.timeout.is_none());
        assert_eq!(config.display_name(), "ffmpeg");
    }

    #[test]
    fn test_program_or_path() {
        let by_name = EngineConfig::default().program_or_path("ffmpeg6");
        assert_eq!(by_name.program, "ffmpeg6");
        assert!(by_name.binary_path.is_none());

        let by_path = EngineConfig::default().program_or_path("/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(by_path.binary_path, Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")));
        assert_eq!(by_path.display_name(), "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .binary_path("/usr/bin/ffmpeg")
            .timeout_secs(90);

        assert_eq!(config.binary_path, Some(PathBuf::from("/usr/bin/ffmpeg")));
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
    }
}
