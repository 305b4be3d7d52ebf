use crate::cli::BreezeScenarioCli;
use clap::Parser;

/// Initialise logging and parse the command line for a scenario binary.
pub fn init() -> BreezeScenarioCli {
    // Ignore the error if a logger was already installed, for example by a test harness.
    let _ = env_logger::try_init();

    BreezeScenarioCli::parse()
}
