//! Tracing subscriber setup.
//!
//! Console logs always go to stderr: stdout carries MCP protocol messages in
//! stdio mode and command output otherwise. With a log directory configured,
//! two rolling files are written as well: `system.<date>.log` with
//! everything the filter lets through and `errors.<date>.log` with errors
//! only.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Rotated files kept per log before the oldest is deleted.
const MAX_LOG_FILES: usize = 7;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output options.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Raise the crate's default level to `debug`.
    pub verbose: bool,
    /// Emit JSON lines instead of human-readable text on stderr.
    pub json: bool,
    /// Directory for the rolling log files. `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    /// Options from command-line flags. `LOG_FORMAT=json` also selects
    /// JSON output and `PARALLEL_LOG_DIR` supplies a directory when none
    /// was given.
    #[must_use]
    pub fn new(verbose: bool, json: bool, log_dir: Option<PathBuf>) -> Self {
        let env_json = std::env::var("LOG_FORMAT")
            .is_ok_and(|v| v.trim().eq_ignore_ascii_case("json"));
        let log_dir = log_dir.or_else(|| {
            std::env::var_os("PARALLEL_LOG_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        });
        Self {
            verbose,
            json: json || env_json,
            log_dir,
        }
    }

    const fn default_filter(&self) -> &'static str {
        if self.verbose {
            "warn,parallel_mcp=debug"
        } else {
            "warn,parallel_mcp=info"
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_filter()))
    }
}

fn rolling_file(dir: &Path, prefix: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}

/// Builds the stderr layer and, with a log directory, the two file layers.
fn layers(config: &LogConfig) -> Result<Vec<BoxedLayer>, InitError> {
    let stderr: BoxedLayer = if config.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .with_filter(config.env_filter())
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(false)
            .with_filter(config.env_filter())
            .boxed()
    };
    let mut layers = vec![stderr];

    if let Some(dir) = &config.log_dir {
        let system = rolling_file(dir, "system")?;
        let errors = rolling_file(dir, "errors")?;
        layers.push(
            fmt::layer()
                .with_writer(system)
                .with_ansi(false)
                .with_filter(config.env_filter())
                .boxed(),
        );
        layers.push(
            fmt::layer()
                .with_writer(errors)
                .with_ansi(false)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
        );
    }
    Ok(layers)
}

/// Initializes the global subscriber. `RUST_LOG` overrides the default
/// filter. Calling this more than once is a no-op.
///
/// # Errors
///
/// Returns [`InitError`] when the log directory or its files cannot be
/// created.
pub fn init_tracing(config: &LogConfig) -> Result<(), InitError> {
    let installed = tracing_subscriber::registry()
        .with(layers(config)?)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            verbose = config.verbose,
            json = config.json,
            log_dir = ?config.log_dir,
            "tracing initialized"
        );
    }
    Ok(())
}
