use clap::Parser;
use std::process::ExitCode;
use vision_pipeline::interfaces::cli::{self, commands::ExportArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::export(ExportArgs::parse()).await
}
