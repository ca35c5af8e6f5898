//! clipod CLI
//!
//! Command-line front end for the clipod podcast editing library.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use clipod::cli::{commands, Cli, Commands};
use clipod::engine::{Engine, EngineConfig, FfmpegEngine};
use clipod::ClipodError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    debug!("clipod v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            match err.downcast_ref::<ClipodError>() {
                Some(clipod_err) => {
                    if let Some(hint) = clipod_err.recovery_suggestion() {
                        eprintln!("hint: {hint}");
                    }
                    // 2 for input the user can fix, 1 for everything else.
                    if clipod_err.is_recoverable() {
                        ExitCode::from(2)
                    } else {
                        ExitCode::FAILURE
                    }
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(ffmpeg) = cli.ffmpeg {
        config = config.program_or_path(ffmpeg);
    }
    if let Some(secs) = cli.timeout {
        config = config.timeout_secs(secs);
    }
    let engine: Arc<dyn Engine> = Arc::new(FfmpegEngine::new(config));

    handle_command(cli.command, engine)
}

fn handle_command(cmd: Commands, engine: Arc<dyn Engine>) -> anyhow::Result<()> {
    match cmd {
        Commands::Bgm {
            main,
            layout,
            output,
        } => commands::bgm(engine.as_ref(), &main, &layout, &output)
            .with_context(|| format!("Failed to mix BGM into {}", output.display())),
        Commands::Export {
            main,
            output,
            layout,
        } => commands::export(engine.as_ref(), &main, &output, layout.as_deref())
            .with_context(|| format!("Failed to export {}", main.display())),
        Commands::Trim {
            input,
            output,
            selection,
            start,
            end,
        } => commands::trim(engine.as_ref(), &input, &output, &selection, start.zip(end))
            .with_context(|| format!("Failed to trim {}", input.display())),
        Commands::Concat {
            main,
            output,
            intro,
            outro,
        } => commands::concat(
            engine.as_ref(),
            &main,
            &output,
            intro.as_deref(),
            outro.as_deref(),
        )
        .with_context(|| format!("Failed to concatenate into {}", output.display())),
        Commands::Delete {
            working,
            start,
            end,
        } => commands::delete(engine, &working, start, end)
            .with_context(|| format!("Failed to delete from {}", working.display())),
        Commands::Punch {
            working,
            start,
            end,
            clip,
        } => commands::punch(engine, &working, start, end, &clip)
            .with_context(|| format!("Failed to punch into {}", working.display())),
        Commands::Undo { working } => commands::undo(engine, &working)
            .with_context(|| format!("Failed to undo {}", working.display())),
        Commands::Status { working } => commands::status(engine, &working)
            .with_context(|| format!("Failed to read status of {}", working.display())),
    }
}
