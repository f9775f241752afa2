use std::env;
use std::io::Write;

use anyhow::anyhow;
use fern::Output;
use indicatif::{ProgressBar, WeakProgressBar};
use log::{LevelFilter, error, info};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::cli::VerbosityLevel;

/// Writer that suspends the currently registered progress bar while log output is written
#[derive(Debug)]
pub struct ProgressHandler<T: Write + Send>(T);

/// Progress bar of the sequence that is currently processed, if any
static CURRENT_PROGRESS_BAR: Lazy<RwLock<Option<WeakProgressBar>>> =
    Lazy::new(|| RwLock::new(None));

impl<T: Write + Send> ProgressHandler<T> {
    pub fn new(pipe: T) -> Self {
        Self(pipe)
    }

    fn suspend_progress<F: FnOnce(&mut T) -> R, R>(&mut self, write: F) -> R {
        match get_progress_bar() {
            Some(pb) => pb.suspend(|| write(&mut self.0)),
            None => write(&mut self.0),
        }
    }
}

impl<T: Write + Send + 'static> ProgressHandler<T> {
    pub fn into_output(self) -> Output {
        let boxed: Box<dyn Write + Send + 'static> = Box::new(self);
        boxed.into()
    }
}

impl<T: Write + Send> Write for ProgressHandler<T> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.suspend_progress(|pipe| pipe.write(buf))
    }

    #[inline]
    fn flush(&mut self) -> std::io::Result<()> {
        self.suspend_progress(|pipe| pipe.flush())
    }
}

/// Registers the progress bar that log output has to be routed around
pub(crate) fn set_progress_bar(pb: Option<WeakProgressBar>) {
    *CURRENT_PROGRESS_BAR.write() = pb;
}

/// Returns the registered progress bar if it is still alive
pub(crate) fn get_progress_bar() -> Option<ProgressBar> {
    CURRENT_PROGRESS_BAR.read().as_ref()?.upgrade()
}

/// Prints an anyhow error and its full error chain using the log::error macro
pub(crate) fn log_error(err: &anyhow::Error) {
    error!("Error occurred: {}", err);
    err.chain()
        .skip(1)
        .for_each(|cause| error!("  caused by: {}", cause));
}

/// Parses a log level name as used in the `RUST_LOG` env variable
fn parse_level_filter(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Initializes logging with fern
///
/// The level is taken from (in this order) quiet mode, the verbosity flags, the `RUST_LOG` env
/// variable and finally defaults to `info`.
pub(crate) fn initialize_logging(
    verbosity: VerbosityLevel,
    quiet_mode: bool,
) -> Result<(), anyhow::Error> {
    let mut unknown_env_level = None;
    let level = if quiet_mode {
        LevelFilter::Off
    } else if let Some(level) = verbosity.into_filter() {
        level
    } else if let Some(env_level) = env::var_os("RUST_LOG") {
        let env_level = env_level.to_string_lossy().to_string();
        parse_level_filter(&env_level).unwrap_or_else(|| {
            unknown_env_level = Some(env_level);
            LevelFilter::Info
        })
    } else {
        LevelFilter::Info
    };

    if matches!(verbosity, VerbosityLevel::None) {
        build_logger(level, |out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                chrono::Local::now().format("%T%.3f"),
                record.level(),
                message
            ))
        })?;
    } else {
        build_logger(level, |out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false),
                record.target(),
                record.level(),
                message
            ))
        })?;
    }

    if let Some(env_level) = unknown_env_level {
        error!(
            "Unknown log filter level '{}' defined in 'RUST_LOG' env variable, using INFO instead.",
            env_level
        );
    }

    Ok(())
}

fn build_logger<F>(level: LevelFilter, formatter: F) -> Result<(), anyhow::Error>
where
    F: Fn(fern::FormatCallback, &std::fmt::Arguments, &log::Record) + Sync + Send + 'static,
{
    fern::Dispatch::new()
        .format(formatter)
        .level(level)
        .chain(ProgressHandler::new(std::io::stdout()).into_output())
        .apply()
        .map_err(|e| anyhow!("Unable to apply logger configuration ({:?})", e))
}

/// Prints program name, version and the command line to the log
pub(crate) fn log_program_info() {
    info!(
        "{} v{} ({})",
        env::args().next().unwrap_or_else(|| "critpoints".to_string()),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_NAME")
    );
    info!(
        "Called with command line: {}",
        env::args().collect::<Vec<_>>().join(" ")
    );
}
