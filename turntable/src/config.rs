use std::net::SocketAddr;

use chrono::Duration;
use clap::Parser;
use turntable_core::ThrottleConfig;

/// One year, the longest throttle duration the core accepts.
const MAX_MINUTES: i64 = 525_600;

/// Command line interface for the turntable server
///
/// Every flag can also be set through the environment variable shown in
/// `--help`.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "TURNTABLE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Base URL of the hosted backend, e.g. https://project.supabase.co
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: String,

    /// Public API key of the hosted backend
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub supabase_key: String,

    /// Consecutive failed logins before an email is locked out
    #[arg(long, env = "TURNTABLE_MAX_LOGIN_ATTEMPTS", default_value_t = 5)]
    pub max_login_attempts: u32,

    /// Lockout length in minutes
    #[arg(
        long,
        env = "TURNTABLE_LOCKOUT_MINUTES",
        default_value_t = 15,
        value_parser = clap::value_parser!(i64).range(1..=MAX_MINUTES)
    )]
    pub lockout_minutes: i64,

    /// Minutes without a failure after which failed logins are forgotten
    #[arg(
        long,
        env = "TURNTABLE_RESET_WINDOW_MINUTES",
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(1..=MAX_MINUTES)
    )]
    pub reset_window_minutes: i64,

    /// Minutes between sweeps of stale login attempt records
    #[arg(
        long,
        env = "TURNTABLE_JANITOR_INTERVAL_MINUTES",
        default_value_t = 60,
        value_parser = clap::value_parser!(i64).range(1..=MAX_MINUTES)
    )]
    pub janitor_interval_minutes: i64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "TURNTABLE_LOG", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig::default()
            .with_max_attempts(self.max_login_attempts)
            .with_lockout_duration(Duration::minutes(self.lockout_minutes))
            .with_reset_window(Duration::minutes(self.reset_window_minutes))
            .with_janitor_interval(Duration::minutes(self.janitor_interval_minutes))
    }
}
