//! Positioning CLI: competitor site collection, brief synthesis and rendering.
//!
//! Exit status follows the error kind: configuration 2, missing input 3,
//! transport 4, schema validation 5, anything else 1.

mod commands;

use std::process::ExitCode;

use clap::Parser;

use commands::Cli;
use positioning_shared::PositioningError;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }
    let cli = Cli::parse();
    commands::init_tracing(&cli);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            let code = report
                .downcast_ref::<PositioningError>()
                .map_or(1, PositioningError::exit_code);
            eprintln!("Error: {report:?}");
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
