//! Analyze command implementation

use crate::cli::output::{
    format_advisory, format_history_table, format_panel_table, format_status,
    format_summary_json, SessionSummary,
};
use crate::cli::AnalyzeArgs;
use crate::config::{LogFormat, PitchlensConfig};
use crate::history::Outcome;
use crate::render::RenderSurface;
use crate::session::{run_session, SessionObserver, SessionState, SessionView};
use crate::transport::{HttpTransport, UploadFile};
use colored::Colorize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &AnalyzeArgs,
) -> Result<PitchlensConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        PitchlensConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        PitchlensConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(ref base_url) = args.base_url {
        config.server.base_url = base_url.clone();
    }
    if let Some(placement) = args.placement {
        config.render.placement = placement;
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Initialize tracing based on configuration
///
/// Logs go to stderr so that `--json` output on stdout stays parseable.
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Prints session progress to the terminal and optionally mirrors the render
/// surface to an image file.
pub struct TerminalObserver {
    quiet: bool,
    frame_out: Option<PathBuf>,
}

impl TerminalObserver {
    pub fn new(quiet: bool, frame_out: Option<PathBuf>) -> Self {
        Self { quiet, frame_out }
    }
}

impl SessionObserver for TerminalObserver {
    fn state_changed(&mut self, state: SessionState, view: &SessionView) {
        if self.quiet {
            return;
        }
        println!("{}", format_status(state, &view.status));
        if let Some(error) = &view.error {
            if state.is_terminal() {
                eprintln!("{}", error.user_message().red());
            }
        }
        if state == SessionState::Closed && view.snapshots > 0 {
            println!("{}", format_panel_table(&view.panel));
        }
    }

    fn metrics_updated(&mut self, view: &SessionView) {
        if self.quiet {
            return;
        }
        println!("{}", view.panel.summary_line());
        if let Some(advisory) = &view.advisory {
            println!("  {}", format_advisory(advisory));
        }
    }

    fn frame_presented(&mut self, seq: u64, surface: &RenderSurface) {
        if let Some(path) = &self.frame_out {
            if let Err(e) = surface.save(path) {
                tracing::warn!(seq, path = %path.display(), error = %e, "Failed to write frame");
            }
        }
    }
}

/// Wait for Ctrl-C (or SIGTERM) and request a user stop
async fn stop_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, stopping analysis...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, stopping analysis...");
        }
    }

    cancel_token.cancel();
}

/// Main analyze command handler
///
/// Runs one session per file, in order. A stop signal ends the current
/// session as completed and skips the remaining files.
pub async fn run_analyze(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    config.validate()?;
    init_tracing(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.server.base_url,
        placement = ?config.render.placement,
        "Starting analysis"
    );

    let transport = HttpTransport::new(&config.server)?;
    let mut machine = crate::session::SessionMachine::from_config(&config);
    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn(stop_signal(cancel.clone()));
    let mut observer = TerminalObserver::new(args.json, args.frame_out.clone());

    let mut summaries = Vec::new();
    let mut failures = 0usize;
    for path in &args.files {
        if cancel.is_cancelled() {
            tracing::info!(file = %path.display(), "Skipping after stop");
            break;
        }
        let file = UploadFile::from_path(path);
        match run_session(&mut machine, &transport, file, &cancel, &mut observer).await {
            Ok(outcome) => {
                if outcome != Outcome::Completed {
                    failures += 1;
                }
                let name = machine
                    .session()
                    .map(|s| s.id.clone())
                    .unwrap_or_else(|| path.display().to_string());
                summaries.push(SessionSummary::new(name, outcome, &machine));
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", path.display(), e.user_message().red());
            }
        }
    }
    signal_task.abort();

    let history = machine.history().entries();
    if args.json {
        println!("{}", format_summary_json(&summaries, &history)?);
    } else if !history.is_empty() {
        println!("{}", format_history_table(&history));
    }

    if failures > 0 {
        return Err(format!(
            "{} of {} session(s) did not complete",
            failures,
            args.files.len()
        )
        .into());
    }
    Ok(())
}
