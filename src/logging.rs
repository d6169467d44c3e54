use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Overrides the default filter, e.g. `APTS_LOG=debug` or
/// `APTS_LOG=apts=debug,reqwest=warn`.
pub const LOG_LEVEL_VAR: &str = "APTS_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Long-running server: request and scrape logs at INFO.
    Serve,
    /// Interactive wizard: only warnings, so log lines do not interleave
    /// with prompts.
    Setup,
}

impl LogMode {
    fn default_directive(self) -> &'static str {
        match self {
            LogMode::Serve => "info",
            LogMode::Setup => "warn",
        }
    }
}

// A setup run can continue into serve mode, so the filter is swapped in place.
static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

pub(crate) fn build_filter(mode: LogMode, requested: Option<&str>) -> EnvFilter {
    requested
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(mode.default_directive()))
}

fn filter_from_env(mode: LogMode) -> EnvFilter {
    let requested = std::env::var(LOG_LEVEL_VAR).ok();
    build_filter(mode, requested.as_deref())
}

/// Install the global subscriber. Later calls only switch the mode.
pub fn init(mode: LogMode) {
    if FILTER_HANDLE.get().is_some() {
        set_mode(mode);
        return;
    }

    let (filter, handle) = reload::Layer::new(filter_from_env(mode));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok();
    if installed {
        FILTER_HANDLE.set(handle).ok();
    }
}

pub fn set_mode(mode: LogMode) {
    if let Some(handle) = FILTER_HANDLE.get() {
        handle.modify(|filter| *filter = filter_from_env(mode)).ok();
    }
}
