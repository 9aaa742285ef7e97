use clap::Parser;
use std::process::ExitCode;
use vision_pipeline::interfaces::cli::{self, commands::DownloadDataArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::download_data(DownloadDataArgs::parse()).await
}
