//! termtris: falling-block puzzle game in the terminal.

mod app;
mod game;
mod input;
mod piece;
mod playfield;
mod rng;
mod scheduler;
mod scoring;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use rng::{PieceSource, RandomSource, ScriptedSource, Sequence};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::{Level, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Starting gravity period in ms.
    pub tick_ms: u64,
    /// Gravity never gets faster than this.
    pub min_tick_ms: u64,
    /// Also end the game when a piece lands with its anchor in the top rows.
    pub legacy_topout: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref(), args.verbose)?;

    let theme = match theme::Theme::load(args.theme.as_deref()) {
        Ok(theme) => theme,
        Err(err) => {
            warn!(%err, "theme not loaded, using defaults");
            theme::Theme::default()
        }
    };
    let config = GameConfig {
        tick_ms: args.tick_ms,
        min_tick_ms: args.min_tick_ms,
        legacy_topout: args.legacy_topout,
    };
    info!(?config, "starting");

    let source: Box<dyn PieceSource> = match (args.pieces, args.seed) {
        (Some(Sequence(kinds)), _) => {
            info!(count = kinds.len(), "scripted piece sequence");
            Box::new(ScriptedSource::new(kinds))
        }
        (None, Some(seed)) => {
            info!(seed, "seeded piece source");
            Box::new(RandomSource::seeded(seed))
        }
        (None, None) => Box::new(RandomSource::from_entropy()),
    };

    let mut app = App::new(config, theme, source);
    let outcome = app.run()?;
    info!(?outcome, "finished");
    println!("Bye! Your score: {} ({} lines)", outcome.score, outcome.lines);
    Ok(())
}

/// Logs go to `path` only; the terminal belongs to the game. Without a path nothing is recorded.
fn init_tracing(path: Option<&std::path::Path>, verbose: u8) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(LevelFilter::from_level(level))
        .init();
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "termtris",
    version,
    about = "Falling-block puzzle game in the terminal. Complete rows to clear them and score.",
    long_about = "termtris is a classic falling-block puzzle for a character terminal.\n\n\
        Seven kinds of pieces fall into a 10-column well. Fill a row edge-to-edge to clear it; \
        clearing several at once scores more. Gravity speeds up slowly as the game goes on.\n\n\
        CONTROLS:\n  Left/Right  Move    Up/Down    Rotate     Space      Hard drop\n  \
        s           Speed up (+1)           p          Pause      q          Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Starting gravity period in milliseconds.
    #[arg(long, default_value = "300", value_name = "MS")]
    pub tick_ms: u64,

    /// Fastest gravity period in milliseconds; speed-ups stop here.
    #[arg(long, default_value = "40", value_name = "MS")]
    pub min_tick_ms: u64,

    /// Seed for the piece generator (same seed, same piece sequence).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Replay a fixed piece sequence in a loop instead of drawing at random (e.g. "IOTLJSZ").
    #[arg(long, value_name = "KINDS", conflicts_with = "seed")]
    pub pieces: Option<Sequence>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses plain ANSI colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Also end the game when a piece lands with its anchor in the top two rows.
    #[arg(long)]
    pub legacy_topout: bool,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More log detail (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceKind;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["termtris"]);
        assert_eq!(args.tick_ms, 300);
        assert_eq!(args.min_tick_ms, 40);
        assert_eq!(args.seed, None);
        assert!(!args.legacy_topout);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_flags() {
        let args = Args::parse_from([
            "termtris",
            "--tick-ms",
            "500",
            "--seed",
            "7",
            "--legacy-topout",
            "-vv",
            "--log-file",
            "/tmp/termtris.log",
        ]);
        assert_eq!(args.tick_ms, 500);
        assert_eq!(args.seed, Some(7));
        assert!(args.legacy_topout);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/termtris.log")));
    }

    #[test]
    fn test_args_piece_sequence() {
        let args = Args::parse_from(["termtris", "--pieces", "ITO"]);
        assert_eq!(
            args.pieces,
            Some(Sequence(vec![PieceKind::I, PieceKind::T, PieceKind::O]))
        );
        assert!(Args::try_parse_from(["termtris", "--pieces", "IQ"]).is_err());
        assert!(Args::try_parse_from(["termtris", "--pieces", "I", "--seed", "1"]).is_err());
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
