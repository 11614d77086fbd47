//! DesignBoard Application
//!
//! Headless host for the DesignBoard editor: loads a configuration, replays a
//! script of toolbar actions and writes downloads to disk.

mod action;
mod app;
mod cli;

pub use action::{Action, parse_script};
pub use app::{App, AppConfig, AppError, RunSummary};
pub use cli::Args;

use designboard_core::EditorConfig;

/// Run the host for parsed command-line arguments.
pub async fn run(args: &Args) -> Result<RunSummary, AppError> {
    let editor = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let json = std::fs::read_to_string(&args.script)
        .map_err(|e| AppError::Io(format!("Failed to read {}: {}", args.script.display(), e)))?;
    let actions = parse_script(&json)?;
    log::info!("Replaying {} actions from {}", actions.len(), args.script.display());

    let base_dir = args
        .script
        .parent()
        .map(|dir| dir.to_path_buf())
        .unwrap_or_default();
    let mut app = App::new(AppConfig {
        editor,
        out_dir: args.out_dir.clone(),
        base_dir,
        strict: args.strict,
    });
    app.run_script(&actions).await
}
