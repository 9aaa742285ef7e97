use clap::Parser;
use std::process::ExitCode;
use vision_pipeline::interfaces::cli::{self, commands::TrainArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::train(TrainArgs::parse()).await
}
