//! Persisted model bundle: fitted encoders plus the serving classifier.
//!
//! The three parts are written as separate JSON files that each carry the
//! same [`ShapeTag`]. Loading checks the tags agree so that files from two
//! different training runs are never combined.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use crate::encoder::{FittedEncoderPair, LabelBinarizer, TfidfVectorizer};
use crate::error::ModelError;
use crate::trainer::MultiLabelClassifier;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const BINARIZER_FILE: &str = "binarizer.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";

/// Identity and dimensions of one training run's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeTag {
    pub run_id: Uuid,
    pub n_features: usize,
    pub n_labels: usize,
}

#[derive(Serialize, Deserialize)]
struct Artifact<T> {
    shape: ShapeTag,
    payload: T,
}

/// Encoders and classifier from a single training run.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub encoders: FittedEncoderPair,
    pub classifier: MultiLabelClassifier,
    run_id: Uuid,
}

impl ModelBundle {
    /// Pairs freshly fitted parts under a new run id.
    pub fn new(
        encoders: FittedEncoderPair,
        classifier: MultiLabelClassifier,
    ) -> Result<Self, ModelError> {
        Self::with_run_id(encoders, classifier, Uuid::new_v4())
    }

    fn with_run_id(
        encoders: FittedEncoderPair,
        classifier: MultiLabelClassifier,
        run_id: Uuid,
    ) -> Result<Self, ModelError> {
        encoders.vectorizer.check_consistency()?;
        classifier.check_consistency()?;
        if classifier.n_features() != encoders.n_features() {
            return Err(ModelError::mismatch(
                "feature width",
                encoders.n_features(),
                classifier.n_features(),
            ));
        }
        if classifier.n_labels() != encoders.n_labels() {
            return Err(ModelError::mismatch(
                "label count",
                encoders.n_labels(),
                classifier.n_labels(),
            ));
        }
        Ok(Self {
            encoders,
            classifier,
            run_id,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn shape(&self) -> ShapeTag {
        ShapeTag {
            run_id: self.run_id,
            n_features: self.encoders.n_features(),
            n_labels: self.encoders.n_labels(),
        }
    }
}

/// Directory holding the three artifact files.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True if every artifact file is present.
    pub fn exists(&self) -> bool {
        [VECTORIZER_FILE, BINARIZER_FILE, CLASSIFIER_FILE]
            .iter()
            .all(|name| self.dir.join(name).is_file())
    }

    /// Writes all three artifacts, each through a temp file and rename.
    pub fn save(&self, bundle: &ModelBundle) -> Result<(), ModelError> {
        fs::create_dir_all(&self.dir)?;
        let shape = bundle.shape();
        self.write(VECTORIZER_FILE, shape, &bundle.encoders.vectorizer)?;
        self.write(BINARIZER_FILE, shape, &bundle.encoders.binarizer)?;
        self.write(CLASSIFIER_FILE, shape, &bundle.classifier)?;
        info!(dir = %self.dir.display(), run_id = %shape.run_id, "saved model bundle");
        Ok(())
    }

    /// Reads and cross-checks all three artifacts.
    pub fn load(&self) -> Result<ModelBundle, ModelError> {
        let vectorizer: Artifact<TfidfVectorizer> = self.read(VECTORIZER_FILE)?;
        let binarizer: Artifact<LabelBinarizer> = self.read(BINARIZER_FILE)?;
        let classifier: Artifact<MultiLabelClassifier> = self.read(CLASSIFIER_FILE)?;

        let shape = vectorizer.shape;
        for (what, other) in [
            ("binarizer run", binarizer.shape),
            ("classifier run", classifier.shape),
        ] {
            if other != shape {
                return Err(ModelError::EncoderMismatch {
                    what,
                    expected: format!("{:?}", shape),
                    found: format!("{:?}", other),
                });
            }
        }

        let encoders = FittedEncoderPair {
            vectorizer: vectorizer.payload,
            binarizer: binarizer.payload,
        };
        if encoders.n_features() != shape.n_features {
            return Err(ModelError::mismatch(
                "vectorizer width",
                shape.n_features,
                encoders.n_features(),
            ));
        }
        if encoders.n_labels() != shape.n_labels {
            return Err(ModelError::mismatch(
                "binarizer classes",
                shape.n_labels,
                encoders.n_labels(),
            ));
        }

        let bundle = ModelBundle::with_run_id(encoders, classifier.payload, shape.run_id)?;
        info!(dir = %self.dir.display(), run_id = %shape.run_id, "loaded model bundle");
        Ok(bundle)
    }

    fn write<T: Serialize>(&self, name: &str, shape: ShapeTag, payload: &T) -> Result<(), ModelError> {
        let target = self.dir.join(name);
        let temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, &Artifact { shape, payload })?;
            writer.flush()?;
        }
        temp.persist(&target).map_err(|e| ModelError::Io(e.error))?;
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Artifact<T>, ModelError> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(ModelError::ArtifactMissing(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
