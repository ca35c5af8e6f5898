//! CLI Module
//!
//! Command-line interface for clipod.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// clipod - podcast editing on top of ffmpeg
#[derive(Parser, Debug)]
#[command(name = "clipod")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ffmpeg executable name or path (overrides CLIPOD_FFMPEG)
    #[arg(long, global = true)]
    pub ffmpeg: Option<String>,

    /// Kill ffmpeg runs after this many seconds (overrides CLIPOD_ENGINE_TIMEOUT_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mix BGM segments under a main audio file using a layout JSON
    #[command(name = "bgm")]
    Bgm {
        /// Main audio file
        main: PathBuf,

        /// Layout JSON; segment paths are relative to its directory
        #[arg(short, long)]
        layout: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export final audio, optionally with BGM
    #[command(name = "export")]
    Export {
        /// Main audio file
        main: PathBuf,

        /// Output file; the extension picks the encoder
        #[arg(short, long, default_value = "final.mp3")]
        output: PathBuf,

        /// Layout JSON with BGM segments
        #[arg(short, long)]
        layout: Option<PathBuf>,
    },

    /// Copy a time range of a file without re-encoding
    #[command(name = "trim")]
    Trim {
        /// Input audio file
        input: PathBuf,

        /// Output audio file
        output: PathBuf,

        /// Selection JSON with start/end seconds
        #[arg(short, long, default_value = "selection.json")]
        selection: PathBuf,

        /// Start in seconds (with --end, instead of a selection file)
        #[arg(long, requires = "end")]
        start: Option<f64>,

        /// End in seconds
        #[arg(long, requires = "start")]
        end: Option<f64>,
    },

    /// Concatenate intro + main + outro
    #[command(name = "concat", alias = "mix")]
    Concat {
        /// Main audio file
        main: PathBuf,

        /// Output audio file
        output: PathBuf,

        /// Intro audio file
        #[arg(long)]
        intro: Option<PathBuf>,

        /// Outro audio file
        #[arg(long)]
        outro: Option<PathBuf>,
    },

    /// Delete a time range from the working file
    #[command(name = "delete")]
    Delete {
        /// Working audio file, edited in place
        working: PathBuf,

        #[arg(long)]
        start: f64,

        #[arg(long)]
        end: f64,
    },

    /// Replace a time range of the working file with a clip
    #[command(name = "punch")]
    Punch {
        /// Working audio file, edited in place
        working: PathBuf,

        #[arg(long)]
        start: f64,

        #[arg(long)]
        end: f64,

        /// Replacement audio, used in full
        #[arg(long)]
        clip: PathBuf,
    },

    /// Restore the working file from its backup
    #[command(name = "undo")]
    Undo {
        /// Working audio file
        working: PathBuf,
    },

    /// Print working file status as JSON
    #[command(name = "status")]
    Status {
        /// Working audio file
        working: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delete() {
        let cli = Cli::parse_from([
            "clipod", "delete", "take.wav", "--start", "1.5", "--end", "3",
        ]);
        match cli.command {
            Commands::Delete {
                working,
                start,
                end,
            } => {
                assert_eq!(working, PathBuf::from("take.wav"));
                assert_eq!(start, 1.5);
                assert_eq!(end, 3.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_engine_flags() {
        let cli = Cli::parse_from([
            "clipod",
            "undo",
            "take.wav",
            "--ffmpeg",
            "/opt/ffmpeg",
            "--timeout",
            "30",
            "-v",
        ]);
        assert_eq!(cli.ffmpeg.as_deref(), Some("/opt/ffmpeg"));
        assert_eq!(cli.timeout, Some(30));
        assert!(cli.verbose);
    }

    #[test]
    fn test_mix_alias_and_export_default() {
        let cli = Cli::parse_from(["clipod", "mix", "main.wav", "out.wav", "--intro", "in.wav"]);
        assert!(matches!(cli.command, Commands::Concat { intro: Some(_), outro: None, .. }));

        let cli = Cli::parse_from(["clipod", "export", "main.wav"]);
        match cli.command {
            Commands::Export { output, layout, .. } => {
                assert_eq!(output, PathBuf::from("final.mp3"));
                assert!(layout.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_trim_range_needs_both_ends() {
        assert!(Cli::try_parse_from(["clipod", "trim", "a.wav", "b.wav", "--start", "1"]).is_err());
    }

    #[test]
    fn test_verify_command() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
