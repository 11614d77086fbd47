//! Main application entry point (native).

use clap::Parser;
use designboard_app::Args;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting DesignBoard");

    let args = Args::parse();
    match pollster::block_on(designboard_app::run(&args)) {
        Ok(summary) => {
            log::info!(
                "Applied {} actions, {} failed, {} downloads",
                summary.applied,
                summary.failed,
                summary.downloads.len()
            );
            for path in &summary.downloads {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("designboard: {}", e);
            ExitCode::FAILURE
        }
    }
}
