// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Arguments are parsed
// with `clap`; all work is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `append`   — adds scraped posts to (or replaces) the corpus file
//   2. `train`    — trains the language model, then samples
//   3. `generate` — loads a checkpoint and samples from a query

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AppendArgs, Commands, GenerateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "post-lm",
    version = "0.1.0",
    about = "Train a word-level LSTM on social-media posts, then generate new ones."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Append(args)   => Self::run_append(args),
            Commands::Train(args)    => Self::run_train(args),
            Commands::Generate(args) => Self::run_generate(args),
        }
    }

    fn run_append(args: AppendArgs) -> Result<()> {
        use crate::application::append_use_case::AppendUseCase;

        let (added, total) = AppendUseCase::new(args.input, args.corpus.clone())
            .with_overwrite(args.overwrite)
            .execute()?;
        tracing::info!("Wrote {} posts to '{}'", added, args.corpus);

        println!("Corpus now holds {} posts.", total);
        Ok(())
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on corpus: {}", args.corpus);

        let text = TrainUseCase::new(args.into()).execute()?;
        println!("{}", text);
        Ok(())
    }

    fn run_generate(args: GenerateArgs) -> Result<()> {
        use crate::application::generate_use_case::GenerateUseCase;

        let use_case = GenerateUseCase::new(&args.checkpoint_dir, &args.model_name)?;
        let text = use_case.generate(&args.query, args.prediction_length, args.seed, args.context)?;
        println!("{}", text);
        Ok(())
    }
}
