//! Logging setup for the `lambda-packager` binary.

use std::str::FromStr;

use clap::Args;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct LogArgs {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Decrease log verbosity (-q warnings only, -qq errors only)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, conflicts_with = "verbose")]
    pub quiet: u8,
}

/// Installs the global subscriber. Progress goes to stderr so stdout stays
/// free for machine-readable output.
pub fn init_global_subscriber(args: LogArgs) {
    let level = log_level(args, std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt = fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry().with(fmt).with(env_filter).init();
}

fn log_level(args: LogArgs, rust_log: Option<&str>) -> LevelFilter {
    match args.quiet {
        0 => (),
        1 => return LevelFilter::WARN,
        _ => return LevelFilter::ERROR,
    }

    if let Some(level) = rust_log.and_then(|value| LevelFilter::from_str(value).ok()) {
        return level;
    }

    match args.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
