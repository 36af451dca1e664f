// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Eight run modes are supported, each dispatching to exactly
// one use case:
//   train, sample-train    — training runs
//   decode, interactive    — forward-only translation
//   eval                   — template/exact accuracy scoring
//   process-data, stats    — corpus preparation and statistics
//   grid-search            — hyperparameter search
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DataArgs, GridSearchArgs, ModelArgs, SampleTrainArgs, StatsArgs, TrainArgs};

use crate::domain::topology::DecoderTopology;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "nl2cmd",
    version = "0.1.0",
    about = "Train a seq2seq model that translates task descriptions into shell commands."
)]
pub struct Cli {
    /// The run mode to dispatch
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::SampleTrain(args) => run_sample_train(args),
            Commands::Decode(args) => run_decode(args),
            Commands::Interactive(args) => run_interactive(args),
            Commands::Eval(args) => run_eval(args),
            Commands::ProcessData(args) => run_process_data(args),
            Commands::Stats(args) => run_stats(args),
            Commands::GridSearch(args) => run_grid_search(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let config = args.into_config()?;
    tracing::info!("Starting {} training run in '{}'", config.topology, config.model_dir);
    TrainUseCase::new(config).execute()?;
    Ok(())
}

fn run_sample_train(args: SampleTrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let config = args.train.into_config()?;
    TrainUseCase::with_sample_size(config, args.sample_size).execute()?;
    Ok(())
}

fn run_decode(args: ModelArgs) -> Result<()> {
    use crate::application::decode_use_case::DecodeUseCase;

    DecodeUseCase::from_model_dir(&args.model_dir)?.execute()?;
    Ok(())
}

fn run_interactive(args: ModelArgs) -> Result<()> {
    use crate::application::decode_use_case::DecodeUseCase;

    DecodeUseCase::from_model_dir(&args.model_dir)?.interactive()
}

fn run_eval(args: ModelArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    EvalUseCase::from_model_dir(&args.model_dir)?.execute()?;
    Ok(())
}

fn run_process_data(args: DataArgs) -> Result<()> {
    use crate::application::process_use_case::ProcessDataUseCase;

    ProcessDataUseCase::new(args.data_dir).execute()
}

fn run_stats(args: StatsArgs) -> Result<()> {
    use crate::application::process_use_case::ProcessDataUseCase;

    let topology = DecoderTopology::from_str(&args.topology)?;
    ProcessDataUseCase::new(args.data_dir).statistics(topology)
}

fn run_grid_search(args: GridSearchArgs) -> Result<()> {
    use crate::application::grid_search::GridSearchUseCase;

    let hyperparameters: Vec<String> =
        args.tuning.split(',').map(|s| s.trim().to_string()).collect();
    let config = args.train.into_config()?;
    GridSearchUseCase::new(config, hyperparameters, args.initialization).execute()?;
    Ok(())
}
