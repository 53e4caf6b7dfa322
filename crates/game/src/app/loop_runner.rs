use std::process::ExitCode;

use engine::run_app;
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_app(app.config, app.scene, app.world) {
        error!(error = %err, "event_loop_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
