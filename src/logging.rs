use std::env;
use std::io::{self, IsTerminal};

use clap::Args;
use tracing_subscriber::EnvFilter;

/// Log verbosity flags shared by every binary.
#[derive(Debug, Args, Clone, Copy, Default)]
pub struct LogArgs {
    /// Print debug logs to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
    /// Only print fatal errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

impl LogArgs {
    /// A usable `RUST_LOG` wins over the flags; an unparsable one is ignored.
    fn filter(self, rust_log: Option<&str>) -> EnvFilter {
        let from_env = rust_log
            .map(str::trim)
            .filter(|directives| !directives.is_empty())
            .and_then(|directives| EnvFilter::try_new(directives).ok());
        if let Some(filter) = from_env {
            return filter;
        }

        if self.quiet {
            return EnvFilter::new("error");
        }
        if self.verbose {
            return EnvFilter::new("roomgen=debug,warn");
        }
        EnvFilter::new("warn")
    }
}

/// Installs the stderr subscriber. Later calls are no-ops.
pub fn init(args: LogArgs) {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(args.filter(rust_log.as_deref()))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_quiet_and_verbose() {
        let quiet = LogArgs {
            quiet: true,
            ..LogArgs::default()
        };
        let verbose = LogArgs {
            verbose: true,
            ..LogArgs::default()
        };

        assert_eq!(quiet.filter(Some("roomgen=trace")).to_string(), "roomgen=trace");
        assert_eq!(verbose.filter(Some("info")).to_string(), "info");
    }

    #[test]
    fn flags_apply_without_rust_log() {
        let quiet = LogArgs {
            quiet: true,
            verbose: true,
        };

        assert_eq!(quiet.filter(None).to_string(), "error");
        assert_eq!(LogArgs::default().filter(Some("  ")).to_string(), "warn");
    }
}
