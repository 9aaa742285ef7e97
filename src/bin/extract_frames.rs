use clap::Parser;
use std::process::ExitCode;
use vision_pipeline::interfaces::cli::{self, commands::ExtractFramesArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::extract_frames(ExtractFramesArgs::parse()).await
}
