//! Utilities: logging setup (tracing subscriber with a dynamic level) and the
//! verbosity flag mapping used by `main`.
//!
//! Key items:
//!   init_logging / derive_level

/// Logging helpers.
pub mod logging {
    use tracing_subscriber::EnvFilter;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Warn = 1,
        Info = 2,
        Debug = 3,
        Trace = 4,
    }

    impl LogLevel {
        pub fn as_str(&self) -> &'static str {
            match self {
                LogLevel::Error => "error",
                LogLevel::Warn => "warn",
                LogLevel::Info => "info",
                LogLevel::Debug => "debug",
                LogLevel::Trace => "trace",
            }
        }
    }

    /// Map `-v` / `-q` flags to a level. Status lines go to stdout regardless,
    /// so the default only surfaces warnings.
    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Directive applied when `RUST_LOG` is not set. `-vvv` opens every target
    /// (HTTP stack included); lower levels stay scoped to this crate.
    pub fn default_directive(level: LogLevel) -> String {
        match level {
            LogLevel::Trace => "trace".to_string(),
            other => format!("{}={}", env!("CARGO_CRATE_NAME"), other.as_str()),
        }
    }

    /// Install the global subscriber. Logs go to stderr so echoed status
    /// lines on stdout are never interleaved with diagnostics.
    pub fn init_logging(level: LogLevel) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

        // A second init (tests, embedding) is harmless.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

}

pub use logging::{derive_level, init_logging};
