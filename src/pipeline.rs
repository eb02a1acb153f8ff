//! End-to-end orchestration of the build and train stages.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::artifacts::{ModelBundle, ModelStore};
use crate::catalog::{CatalogApi, ImageCache};
use crate::dataset::{BuildOptions, BuildSummary, CorpusSink, DatasetBuilder, load_corpus};
use crate::encoder::{FittedEncoderPair, VectorizerConfig};
use crate::trainer::{CrossValidatedTrainer, FoldReport, TrainerConfig};

/// Where and how much to build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub output: PathBuf,
    pub count: usize,
    /// Keep existing rows and continue after them.
    pub append: bool,
    /// Capture covers into this directory when set.
    pub images: Option<PathBuf>,
    pub options: BuildOptions,
}

/// Builds (or extends) the corpus file described by `request`.
pub fn build_dataset(client: &dyn CatalogApi, request: &BuildRequest) -> Result<BuildSummary> {
    let sink = if request.append {
        CorpusSink::append(&request.output)
    } else {
        CorpusSink::create(&request.output)
    }
    .with_context(|| format!("Failed to open corpus file: {}", request.output.display()))?;

    let mut builder = DatasetBuilder::new(client, sink).options(request.options.clone());
    if let Some(dir) = &request.images {
        builder = builder.images(ImageCache::new(dir.clone()));
    }

    let summary = builder
        .build(request.count)
        .context("Dataset build aborted")?;
    info!(
        processed = summary.processed,
        written = summary.written,
        skipped = summary.skipped,
        images = summary.images,
        "dataset build finished"
    );
    Ok(summary)
}

/// Inputs and hyperparameters for a training run.
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub corpus: PathBuf,
    pub models: PathBuf,
    pub vectorizer: VectorizerConfig,
    pub trainer: TrainerConfig,
}

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub samples: usize,
    pub reports: Vec<FoldReport>,
    pub bundle: ModelBundle,
}

/// Loads the corpus, cross-validates, fits the serving model and saves it.
///
/// The saved classifier is a fresh fit on every corpus row; fold
/// classifiers only contribute their reports.
pub fn train(request: &TrainRequest) -> Result<TrainOutcome> {
    let rows = load_corpus(&request.corpus)
        .with_context(|| format!("Failed to read corpus: {}", request.corpus.display()))?;
    if rows.is_empty() {
        bail!(
            "Corpus {} has no rows with tags; build a dataset first",
            request.corpus.display()
        );
    }
    info!(rows = rows.len(), corpus = %request.corpus.display(), "loaded corpus");

    let encoders =
        FittedEncoderPair::fit(&rows, request.vectorizer).context("Failed to fit encoders")?;
    let (x, y) = encoders.encode_rows(&rows);

    let trainer = CrossValidatedTrainer::new(request.trainer);
    let reports = trainer
        .train_and_evaluate(&x, &y, encoders.binarizer.classes())
        .context("Cross-validation failed")?;
    if reports.is_empty() {
        warn!("no fold produced a report");
    }

    let classifier = trainer
        .fit_final(&x, &y)
        .context("Failed to fit final classifier")?;
    let bundle = ModelBundle::new(encoders, classifier)?;
    ModelStore::new(&request.models)
        .save(&bundle)
        .with_context(|| format!("Failed to save models to {}", request.models.display()))?;

    Ok(TrainOutcome {
        samples: rows.len(),
        reports,
        bundle,
    })
}
