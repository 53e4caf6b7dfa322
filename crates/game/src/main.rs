use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod app {
    pub(crate) mod bootstrap;
    pub(crate) mod config;
    pub(crate) mod gameplay;
    pub(crate) mod loop_runner;
}

use app::bootstrap::{build_app, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match build_app(cli) {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
