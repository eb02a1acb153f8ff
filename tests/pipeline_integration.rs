/// End-to-end tests: corpus file -> cross-validation -> saved bundle -> prediction.
use std::path::Path;

use mangenre::artifacts::{CLASSIFIER_FILE, ModelStore};
use mangenre::dataset::CorpusSink;
use mangenre::encoder::{SparseVector, VectorizerConfig};
use mangenre::error::ModelError;
use mangenre::inference::{GenrePredictor, score};
use mangenre::models::{CorpusRow, TagSet};
use mangenre::pipeline::{TrainRequest, train};
use mangenre::trainer::{CrossValidatedTrainer, LogisticOptions, TrainerConfig};

const ACTION: [&str; 6] = ["sword", "battle", "warrior", "blade", "duel", "army"];
const ROMANCE: [&str; 6] = ["love", "kiss", "heart", "wedding", "crush", "sweetheart"];
const HORROR: [&str; 6] = ["ghost", "blood", "curse", "haunted", "scream", "corpse"];

fn tags(names: &[&str]) -> TagSet {
    names.iter().map(|s| s.to_string()).collect()
}

fn synthetic_rows() -> Vec<CorpusRow> {
    let mut rows = Vec::new();
    for i in 0..20 {
        for (genre, words) in [("Action", ACTION), ("Romance", ROMANCE), ("Horror", HORROR)] {
            let mut synopsis: Vec<&str> = (0..3).map(|k| words[(i + k) % words.len()]).collect();
            let mut labels = vec![genre];
            if genre == "Action" && i % 5 == 0 {
                synopsis.push(ROMANCE[i % ROMANCE.len()]);
                labels.push("Romance");
            }
            rows.push(CorpusRow {
                title_primary: format!("{} tale {}", words[i % words.len()], i),
                title_secondary: String::new(),
                synopsis: format!("a story of {}", synopsis.join(" ")),
                tags: tags(&labels),
                image_ref: None,
            });
        }
    }
    rows
}

fn write_corpus(path: &Path, rows: &[CorpusRow]) {
    let mut sink = CorpusSink::create(path).unwrap();
    for row in rows {
        sink.write_row(row).unwrap();
    }
}

fn request(dir: &Path, folds: usize) -> TrainRequest {
    TrainRequest {
        corpus: dir.join("corpus.csv"),
        models: dir.join("models"),
        vectorizer: VectorizerConfig::default(),
        trainer: TrainerConfig {
            folds,
            logistic: LogisticOptions {
                c: 10.0,
                ..LogisticOptions::default()
            },
            ..TrainerConfig::default()
        },
    }
}

#[test]
fn train_save_load_and_predict() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), 4);
    write_corpus(&req.corpus, &synthetic_rows());

    let outcome = train(&req).expect("training succeeds");

    assert_eq!(outcome.samples, 60);
    assert_eq!(outcome.reports.len(), 4);
    for report in &outcome.reports {
        assert!(report.test_size > 0);
        assert_eq!(report.train_size + report.test_size, 60);
        assert_eq!(report.labels.len(), 3);
        assert!(report.micro.f1 > 0.5, "fold {} micro f1 {}", report.fold, report.micro.f1);
    }

    let bundle = ModelStore::new(&req.models).load().expect("bundle loads");
    assert_eq!(bundle.run_id(), outcome.bundle.run_id());

    let predictor = GenrePredictor::new(bundle);
    let predicted = predictor
        .predict("Ghost Manor", "a haunted house with a curse and blood")
        .unwrap();
    assert!(predicted.contains("Horror"));
    assert!(!predicted.contains("Action"));

    let result = predictor
        .evaluate("Blade Oath", "a warrior duel with a sword", &tags(&["Action", "Drama"]))
        .unwrap();
    assert!(result.predicted_tags.contains("Action"));
    assert_eq!(result.accuracy, 0.5);
}

#[test]
fn unrelated_text_predicts_nothing_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), 3);
    write_corpus(&req.corpus, &synthetic_rows());
    train(&req).unwrap();

    let predictor = GenrePredictor::new(ModelStore::new(&req.models).load().unwrap());
    let predicted = predictor.predict("", "").unwrap();
    let result = predictor.evaluate("", "", &TagSet::new()).unwrap();

    assert!(predicted.len() <= 3);
    assert_eq!(result.accuracy, 0.0);
}

#[test]
fn rare_tag_in_one_of_a_thousand_samples_reports_zero() {
    let n = 1000;
    let x: Vec<SparseVector> = (0..n)
        .map(|i| SparseVector::from_pairs(4, vec![(i % 3, 1.0), (3, 0.5)]))
        .collect();
    let y: Vec<Vec<bool>> = (0..n).map(|i| vec![i % 3 == 0, i % 3 == 1, i == 500]).collect();
    let labels = vec!["Action".to_string(), "Romance".to_string(), "Yuri".to_string()];

    let trainer = CrossValidatedTrainer::new(TrainerConfig::default());
    let reports = trainer
        .train_and_evaluate(&x, &y, &labels)
        .expect("rare tag must not break fold reporting");

    assert_eq!(reports.len(), 5);
    let rare_supports: Vec<usize> = reports.iter().map(|r| r.labels[2].support).collect();
    assert_eq!(rare_supports.iter().sum::<usize>(), 1);
    for report in &reports {
        let rare = &report.labels[2];
        if rare.support == 0 {
            assert_eq!(rare.recall, 0.0);
            assert!(rare.recall_undefined);
        }
        assert!(report.to_string().contains("Yuri"));
    }
}

#[test]
fn too_many_folds_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), 61);
    write_corpus(&req.corpus, &synthetic_rows());

    let err = train(&req).unwrap_err();
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<ModelError>(),
        Some(ModelError::InvalidFolds { folds: 61, samples: 60 })
    )));
}

#[test]
fn empty_corpus_fails_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), 3);
    CorpusSink::create(&req.corpus).unwrap();

    let err = train(&req).unwrap_err();
    assert!(err.to_string().contains("no rows with tags"));
    assert!(!req.models.exists());
}

#[test]
fn loading_without_training_reports_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelStore::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, ModelError::ArtifactMissing(_)));
}

#[test]
fn retraining_replaces_every_artifact_together() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path(), 3);
    write_corpus(&req.corpus, &synthetic_rows());

    let first = train(&req).unwrap();
    let stale = std::fs::read(req.models.join(CLASSIFIER_FILE)).unwrap();
    let second = train(&req).unwrap();
    assert_ne!(first.bundle.run_id(), second.bundle.run_id());

    std::fs::write(req.models.join(CLASSIFIER_FILE), stale).unwrap();
    assert!(matches!(
        ModelStore::new(&req.models).load(),
        Err(ModelError::EncoderMismatch { .. })
    ));
}

#[test]
fn recall_scenarios() {
    let predicted = tags(&["Action", "Comedy"]);
    let actual = tags(&["Action", "Drama", "Comedy"]);
    assert!((score(&predicted, &actual) - 0.667).abs() < 0.001);
    assert_eq!(score(&actual, &actual), 1.0);
    assert_eq!(score(&predicted, &TagSet::new()), 0.0);
}
