// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// The `append`, `train` and `generate` subcommands and their flags.

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Append scraped posts (a JSON array of {title, body}) to the corpus
    Append(AppendArgs),

    /// Train the language model on the corpus
    Train(TrainArgs),

    /// Generate text from a trained checkpoint
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct AppendArgs {
    /// JSON file written by the scraper
    #[arg(long)]
    pub input: String,

    /// Corpus file to append to (created if missing)
    #[arg(long, default_value = "tmp.bin")]
    pub corpus: String,

    /// Replace the corpus contents instead of appending to them
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Corpus file built with `append`
    #[arg(long, default_value = "tmp.bin")]
    pub corpus: String,

    /// Directory for model, optimiser, vocabulary and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "model1")]
    pub model_name: String,

    #[arg(long, default_value = "optim1")]
    pub optim_name: String,

    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// Tokens per training window
    #[arg(long, default_value_t = 10, value_parser = at_least_one)]
    pub sequence_length: usize,

    /// Embedding width and LSTM hidden size
    #[arg(long, default_value_t = 128)]
    pub d_model: usize,

    /// Number of stacked LSTM layers
    #[arg(long, default_value_t = 3)]
    pub num_layers: usize,

    /// Dropout between LSTM layers
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Log the batch loss every n batches
    #[arg(long, default_value_t = 100)]
    pub log_every: usize,

    /// Batches prepared ahead on a worker thread, 0 to batch inline
    #[arg(long, default_value_t = 0)]
    pub prefetch: usize,

    /// Put each post's title in front of its body in the token stream
    #[arg(long)]
    pub with_titles: bool,

    /// Continue from the model and optimiser saved in --checkpoint-dir
    #[arg(long)]
    pub resume: bool,

    /// Seed phrase sampled from once training ends
    #[arg(long, default_value = "does anyone else")]
    pub query: String,

    /// Number of tokens to sample after the query
    #[arg(long, default_value_t = 50)]
    pub prediction_length: usize,

    /// Random seed for sampling; omit for a different result each run
    #[arg(long)]
    pub seed: Option<u64>,
}

fn at_least_one(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0)  => Err("must be at least 1".to_string()),
        Ok(n)  => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus:            a.corpus,
            checkpoint_dir:    a.checkpoint_dir,
            model_name:        a.model_name,
            optim_name:        a.optim_name,
            epochs:            a.epochs,
            batch_size:        a.batch_size,
            lr:                a.lr,
            sequence_length:   a.sequence_length,
            d_model:           a.d_model,
            num_layers:        a.num_layers,
            dropout:           a.dropout,
            log_every:         a.log_every,
            prefetch:          a.prefetch,
            with_titles:       a.with_titles,
            resume:            a.resume,
            query:             a.query,
            prediction_length: a.prediction_length,
            seed:              a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory the model was trained into
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "model1")]
    pub model_name: String,

    #[arg(long, default_value = "does anyone else")]
    pub query: String,

    #[arg(long, default_value_t = 50)]
    pub prediction_length: usize,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Feed only the last n tokens to the model at each step
    #[arg(long)]
    pub context: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["post-lm", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.sequence_length, 10);
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.num_layers, 3);
        assert_eq!(cfg.query, "does anyone else");
        assert!(!cfg.resume);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "post-lm", "train", "--epochs", "3", "--with-titles", "--resume", "--seed", "7",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.epochs, 3);
        assert!(cfg.with_titles);
        assert!(cfg.resume);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        assert!(Cli::try_parse_from(["post-lm", "train", "--sequence-length", "0"]).is_err());
        assert!(Cli::try_parse_from(["post-lm", "train", "--sequence-length", "1"]).is_ok());
    }

    #[test]
    fn test_append_requires_input() {
        assert!(Cli::try_parse_from(["post-lm", "append"]).is_err());
    }

    #[test]
    fn test_append_overwrite_flag() {
        let cli = Cli::try_parse_from(["post-lm", "append", "--input", "posts.json", "--overwrite"]).unwrap();
        let Commands::Append(args) = cli.command else { panic!("expected append") };
        assert!(args.overwrite);
        assert_eq!(args.corpus, "tmp.bin");
    }

    #[test]
    fn test_generate_context_flag() {
        let cli = Cli::try_parse_from(["post-lm", "generate", "--context", "20"]).unwrap();
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };
        assert_eq!(args.context, Some(20));
        assert_eq!(args.prediction_length, 50);
    }
}
