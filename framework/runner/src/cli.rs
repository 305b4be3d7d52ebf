use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(about, long_about = None)]
pub struct BreezeScenarioCli {
    /// Base URL of the API under test, for example `http://localhost:3000/api`
    #[clap(short, long, env = "BREEZE_TARGET_URL")]
    pub target_url: Option<String>,

    /// The number of virtual users to run concurrently
    #[clap(long)]
    pub vus: Option<usize>,

    /// The number of seconds to run the scenario for
    #[clap(long)]
    pub duration: Option<u64>,

    /// Run this many iterations per virtual user instead of running for a fixed duration.
    ///
    /// Takes precedence over `--duration` when both are given.
    #[clap(long)]
    pub iterations: Option<u64>,

    /// Override the pacing delay after every step, in milliseconds
    #[clap(long)]
    pub sleep_ms: Option<u64>,

    /// Seconds to wait for a response before counting the request as an error
    #[clap(long, default_value = "30")]
    pub request_timeout_s: u64,

    /// Spread the start of the virtual users evenly over this many seconds.
    ///
    /// By default all virtual users start at the same time.
    #[clap(long)]
    pub ramp_up_s: Option<u64>,

    /// Log an interim summary every this many seconds
    #[clap(long)]
    pub report_interval_s: Option<u64>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Append a JSON summary of the run to this file
    #[clap(long)]
    pub summary_file: Option<PathBuf>,

    /// Append interim and final metric snapshots to this file as JSON lines
    #[clap(long)]
    pub report_file: Option<PathBuf>,
}
