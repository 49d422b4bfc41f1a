// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands off to Layer 2.
//
// Two commands are supported:
//   1. `train`  — train (or resume training) the sentiment model
//   2. `params` — print the saved hyperparameters and latest step
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ParamsArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-trainer",
    version = "0.1.0",
    about = "Train an LSTM sentiment classifier with periodic checkpoints and plateau learning-rate decay."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Params(args) => run_params(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};

    let config = TrainConfig::try_from(args)?;
    tracing::info!("Starting training on shards in: {}", config.data_dir.display());

    let summary = TrainUseCase::new(config).execute()?;
    match &summary.resumed_from {
        Some(snapshot) => println!("Resumed from {}.", snapshot.display()),
        None           => println!("Started from fresh parameters."),
    }
    println!(
        "Training complete. Global step {} ({} steps this run), learning rate {:.6}, {} checkpoints saved.",
        summary.final_step,
        summary.steps,
        summary.learning_rate,
        summary.checkpoints.len()
    );
    Ok(())
}

fn run_params(args: ParamsArgs) -> Result<()> {
    use crate::application::params_use_case::ParamsUseCase;

    let report = ParamsUseCase::new(args.checkpoint_dir).execute()?;
    print!("{}", report.render());
    Ok(())
}
