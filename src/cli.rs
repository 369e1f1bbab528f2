use crate::config::AppConfig;
use crate::model::{CardView, LoadStatus, Mode, Snapshot};
use crate::session::{LoadOutcome, SessionController};
use crate::source::{CardSource, FileSource, HttpSource};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "card-draw",
    version,
    about = "Draw cards, read hidden words, or lay out a six-card divination spread"
)]
pub struct Cli {
    /// Fetch card pools over HTTP(S) from this base URL instead of the data directory
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory holding the card pool JSON files
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Path to a JSON config file (defaults to <config dir>/card-draw/config.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Starting mode: simple, divination, hiddenen, hiddenzh, ...
    #[arg(long, default_value = "simple")]
    pub mode: String,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Number of cards to draw in simple and text-only modes
    #[arg(long, default_value_t = 1)]
    pub draws: usize,

    /// Pool indices to pick, in order, in divination mode (e.g. 0,2,1,3,4,5)
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<usize>,

    /// Use --show-images true or --show-images false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub show_images: bool,

    /// Base path prepended to card image names (overrides config file)
    #[arg(long)]
    pub image_base: Option<String>,

    /// Upper bound for a single pool fetch (overrides config file)
    #[arg(long)]
    pub fetch_timeout: Option<humantime::Duration>,

    /// Write logs to this file (the TUI discards logs otherwise)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Install the tracing subscriber.
///
/// One-shot modes log to stderr. The TUI owns the terminal, so it only logs
/// when a log file is given.
pub fn init_tracing(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        None if !interactive => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
        None => {}
    }
    Ok(())
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

/// Build the effective configuration: config file (or defaults) plus CLI overrides.
pub fn build_config(args: &Cli) -> Result<AppConfig> {
    let mut cfg = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(base) = args.image_base.as_ref() {
        cfg.image_base_path = base.clone();
    }
    if let Some(timeout) = args.fetch_timeout {
        cfg.fetch_timeout = timeout.into();
    }
    cfg.validate()?;
    Ok(cfg)
}

/// HTTP source when a base URL is given, data directory otherwise.
pub fn build_source(args: &Cli, cfg: &AppConfig) -> Result<Arc<dyn CardSource>> {
    match args.base_url.as_deref() {
        Some(base) => Ok(Arc::new(HttpSource::new(base)?)),
        None => Ok(Arc::new(FileSource::new(&args.data_dir))),
    }
}

/// Parse the requested mode, falling back to simple for unknown names.
pub fn initial_mode(name: &str) -> Mode {
    name.parse().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to simple mode");
        Mode::Simple
    })
}

/// Result of a one-shot session.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub snapshot: Snapshot,
    pub drawn: Vec<CardView>,
}

/// Load the requested mode, apply `--draws` or `--select`, and report.
pub async fn run_once(args: &Cli) -> Result<SessionReport> {
    let cfg = build_config(args)?;
    let source = build_source(args, &cfg)?;
    let mode = initial_mode(&args.mode);

    let mut session = SessionController::new(cfg);
    session.set_show_images(args.show_images);

    if session.enter_mode(source.as_ref(), mode).await == LoadOutcome::Failed {
        let snap = session.snapshot();
        let detail = match &snap.status {
            LoadStatus::Failed { kind, error, .. } => format!("{}: {error}", kind.label()),
            _ => String::new(),
        };
        return Err(anyhow::anyhow!("{} ({detail})", snap.status_message));
    }

    let mut drawn = Vec::new();
    if session.mode().is_divination() {
        for &index in &args.select {
            session.toggle_select(index);
        }
    } else {
        for _ in 0..args.draws {
            if let Some(card) = session.draw_random() {
                drawn.push(card);
            }
        }
    }

    Ok(SessionReport {
        snapshot: session.snapshot(),
        drawn,
    })
}

async fn run_json(args: Cli) -> Result<()> {
    let report = run_once(&args).await?;
    let out = serde_json::to_string_pretty(&report)?;
    println!("{out}");
    Ok(())
}

async fn run_text(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    let report = run_once(&args).await?;
    let _ = out_tx.send(OutputLine::Stderr(report.snapshot.status_message.clone()));

    let summary = crate::text_summary::build_text_summary(&report.snapshot, &report.drawn);
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selection_list() {
        let args = Cli::parse_from([
            "card-draw",
            "--text",
            "--mode",
            "divination",
            "--select",
            "0,2,1",
        ]);
        assert_eq!(args.select, vec![0, 2, 1]);
        assert!(args.text);
        assert!(args.show_images);
    }

    #[test]
    fn unknown_mode_starts_simple() {
        assert_eq!(initial_mode("tarot"), Mode::Simple);
        assert_eq!(initial_mode("hiddenzh"), Mode::HiddenText("zh".into()));
    }

    #[test]
    fn cli_overrides_config_values() {
        let args = Cli::parse_from([
            "card-draw",
            "--image-base",
            "/static/cards",
            "--fetch-timeout",
            "2s",
            "--config",
            "/nonexistent/card-draw.json",
        ]);
        // Explicit config path must exist.
        assert!(build_config(&args).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"image_base_path": "imgs"}"#).unwrap();
        let args = Cli {
            config: Some(path),
            ..args
        };
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.image_base_path, "/static/cards");
        assert_eq!(cfg.fetch_timeout, std::time::Duration::from_secs(2));
    }

    #[tokio::test]
    async fn one_shot_divination_reads_in_pick_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cards_filled.json"),
            r#"[{"name":"A"},{"name":"B"},{"name":"C"},{"name":"D"},{"name":"E"},{"name":"F"}]"#,
        )
        .unwrap();
        let args = Cli::parse_from([
            "card-draw".to_string(),
            "--json".to_string(),
            "--mode".to_string(),
            "divination".to_string(),
            "--select".to_string(),
            "0,2,1,3,4,5".to_string(),
            "--data-dir".to_string(),
            dir.path().display().to_string(),
        ]);

        let report = run_once(&args).await.unwrap();
        let reading = report.snapshot.spread.unwrap().reading.unwrap();
        let indices: Vec<usize> = reading.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 2, 1, 3, 4, 5]);
        assert!(report.drawn.is_empty());
    }

    #[tokio::test]
    async fn one_shot_fails_when_pool_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let args = Cli::parse_from([
            "card-draw".to_string(),
            "--text".to_string(),
            "--data-dir".to_string(),
            dir.path().display().to_string(),
        ]);
        let err = run_once(&args).await.unwrap_err();
        assert!(err.to_string().contains("cards_filled.json"));
        assert!(err.to_string().contains("fetch error"), "got: {err}");
    }
}
