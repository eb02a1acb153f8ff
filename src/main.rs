use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mangenre::artifacts::ModelStore;
use mangenre::catalog::ImageCache;
use mangenre::dataset::BuildOptions;
use mangenre::encoder::VectorizerConfig;
use mangenre::error::ModelError;
use mangenre::inference::GenrePredictor;
use mangenre::pipeline::{self, BuildRequest, TrainRequest};
use mangenre::service::{GenreService, ServiceError};
use mangenre::trainer::{LogisticOptions, Solver, TrainerConfig};
use mangenre::utils::{ensure_parent_directory, format_percent, format_tags};
use mangenre::{Settings, SettingsBuilder};

/// mangenre - manga genre tagging from titles and synopses
#[derive(Parser)]
#[command(name = "mangenre")]
#[command(about = "Build a manga corpus, train a genre classifier and tag new titles")]
#[command(version)]
struct Cli {
    /// Override the data directory (corpus, images, models)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Download catalog items into the training corpus
    Build(BuildCommand),
    /// Cross-validate and train the genre classifier
    Train(TrainCommand),
    /// Predict genres for a catalog link and score them
    Predict(PredictCommand),
}

#[derive(Args)]
struct BuildCommand {
    /// Number of listing items to process
    #[arg(short, long, value_name = "N")]
    count: usize,

    /// Listing offset to start from
    #[arg(long, value_name = "K", default_value_t = 0)]
    offset: usize,

    /// Append to an existing corpus instead of replacing it
    #[arg(long)]
    append: bool,

    /// Also download cover images
    #[arg(long)]
    images: bool,

    /// Corpus file to write
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct TrainCommand {
    /// Corpus file to read
    #[arg(long, value_name = "PATH")]
    corpus: Option<PathBuf>,

    /// Directory for model artifacts
    #[arg(long, value_name = "DIR")]
    models: Option<PathBuf>,

    /// Number of cross-validation folds
    #[arg(long, value_name = "K", default_value_t = 5)]
    folds: usize,

    /// Vocabulary size cap
    #[arg(long, value_name = "V", default_value_t = 10_000)]
    max_features: usize,

    /// Solver iteration cap per label
    #[arg(long, value_name = "I", default_value_t = 1000)]
    max_iter: usize,

    /// Inverse regularization strength
    #[arg(long, value_name = "C", default_value_t = 1.0)]
    c: f64,

    /// Optimizer: lbfgs or gradient-descent
    #[arg(long, value_name = "SOLVER", default_value_t = Solver::Lbfgs)]
    solver: Solver,

    /// Seed for fold assignment
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Split camelCase words before tokenizing
    #[arg(long)]
    camel_case: bool,
}

#[derive(Args)]
struct PredictCommand {
    /// Catalog link, e.g. https://mangadex.org/title/<id>
    #[arg(value_name = "LINK")]
    link: String,

    /// Directory holding model artifacts
    #[arg(long, value_name = "DIR")]
    models: Option<PathBuf>,

    /// Directory for cached cover thumbnails
    #[arg(long, value_name = "DIR")]
    covers: Option<PathBuf>,
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result = settings(&cli).and_then(|settings| match &cli.command {
        Commands::Build(cmd) => handle_build(cmd, &settings),
        Commands::Train(cmd) => handle_train(cmd, &settings),
        Commands::Predict(cmd) => handle_predict(cmd, &settings),
    });

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        match e.downcast_ref::<ServiceError>() {
            Some(service_error) => eprintln!("Error: {}", service_error.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(exit_code);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `mangenre=info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mangenre=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad links and invalid fold counts. Everything else
/// (network, I/O, missing artifacts) is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<ServiceError>()
            .is_some_and(ServiceError::is_user_error)
            || matches!(
                cause.downcast_ref::<ModelError>(),
                Some(ModelError::InvalidFolds { .. })
            )
    })
}

fn settings(cli: &Cli) -> Result<Settings> {
    let mut builder = SettingsBuilder::new();
    if let Some(dir) = &cli.data_dir {
        builder = builder.data_dir(dir);
    }
    builder.build().context("Failed to resolve settings")
}

fn handle_build(cmd: &BuildCommand, settings: &Settings) -> Result<()> {
    let output = cmd.output.clone().unwrap_or_else(|| settings.corpus_path());
    ensure_parent_directory(&output)?;
    let client = settings
        .catalog_client()
        .context("Failed to create catalog client")?;

    let request = BuildRequest {
        output: output.clone(),
        count: cmd.count,
        append: cmd.append,
        images: cmd.images.then(|| settings.images_dir()),
        options: BuildOptions {
            start_offset: cmd.offset,
            pacing: settings.pacing,
            ..BuildOptions::default()
        },
    };
    let summary = pipeline::build_dataset(&client, &request)?;

    println!(
        "Processed {} items: {} written, {} skipped, {} covers saved",
        summary.processed, summary.written, summary.skipped, summary.images
    );
    println!("Corpus: {}", output.display());
    Ok(())
}

fn handle_train(cmd: &TrainCommand, settings: &Settings) -> Result<()> {
    let request = TrainRequest {
        corpus: cmd.corpus.clone().unwrap_or_else(|| settings.corpus_path()),
        models: cmd.models.clone().unwrap_or_else(|| settings.models_dir()),
        vectorizer: VectorizerConfig {
            max_features: cmd.max_features,
            split_camel_case: cmd.camel_case,
        },
        trainer: TrainerConfig {
            folds: cmd.folds,
            seed: cmd.seed,
            logistic: LogisticOptions {
                c: cmd.c,
                max_iter: cmd.max_iter,
                solver: cmd.solver,
                ..LogisticOptions::default()
            },
        },
    };

    let outcome = pipeline::train(&request)?;
    for report in &outcome.reports {
        println!("{report}");
    }
    let shape = outcome.bundle.shape();
    println!(
        "Trained on {} samples ({} features, {} labels); run {} saved to {}",
        outcome.samples,
        shape.n_features,
        shape.n_labels,
        shape.run_id,
        request.models.display()
    );
    Ok(())
}

fn handle_predict(cmd: &PredictCommand, settings: &Settings) -> Result<()> {
    let models = cmd.models.clone().unwrap_or_else(|| settings.models_dir());
    let covers = cmd.covers.clone().unwrap_or_else(|| settings.covers_dir());

    let bundle = ModelStore::new(&models)
        .load()
        .map_err(ServiceError::from)?;
    let client = settings
        .catalog_client()
        .map_err(ServiceError::from)?;
    let service = GenreService::new(
        client,
        GenrePredictor::new(bundle),
        ImageCache::new(covers).thumbnails(),
    );

    let report = service.lookup(&cmd.link)?;

    println!("{} ({})", report.title, report.id);
    println!("Predicted: {}", format_tags(&report.prediction.predicted_tags));
    println!("Actual:    {}", format_tags(&report.actual_tags));
    println!(
        "Accuracy:  {} (precision {})",
        format_percent(report.prediction.accuracy),
        format_percent(report.precision)
    );
    match report.cover.path() {
        Some(path) => println!("Cover:     {}", path.display()),
        None => println!("Cover:     (placeholder)"),
    }
    Ok(())
}
