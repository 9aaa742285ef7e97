use clap::Parser;
use std::process::ExitCode;
use vision_pipeline::interfaces::cli::{self, commands::DownscaleArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::downscale(DownscaleArgs::parse()).await
}
