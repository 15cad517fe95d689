use std::path::Path;

use rusqlite::{Connection, params};
use tempfile::tempdir;

use triage::cli::args::{TrainInvocation, parse_train_args};
use triage::cli::commands::execute_train;
use triage::config::TrainingConfig;
use triage::corpus::{CorpusLayout, load_corpus};
use triage::error::{Stage, TriageError};
use triage::ml::forest::ForestConfig;
use triage::ml::search::ParamGrid;
use triage::pipeline::TrainedModel;

const CATEGORIES: [&str; 3] = ["related", "water", "food"];

/// Twenty labeled messages: (message, related, water, food).
fn rows() -> Vec<(String, u8, u8, u8)> {
    let water = [
        "We need clean drinking water",
        "No water in the village since the storm",
        "Please send water bottles to the shelter",
        "The well is contaminated and people are thirsty",
        "Water pipes broke after the earthquake",
    ];
    let food = [
        "Children are hungry and need food",
        "Send rice and food supplies please",
        "We have not eaten for three days",
        "Food distribution is needed in the camp",
        "Running out of food and milk",
    ];
    let both = [
        "We need food and water urgently",
        "Send water and food to the families",
    ];
    let unrelated = [
        "Thanks for the concert tickets",
        "What a beautiful sunny day",
        "Looking forward to the football match",
        "The new phone arrived today",
        "Happy birthday to my sister",
        "The movie was really good",
        "Meeting moved to next week",
        "Great dinner with friends tonight",
    ];

    let mut rows = Vec::new();
    rows.extend(water.iter().map(|m| (m.to_string(), 1, 1, 0)));
    rows.extend(food.iter().map(|m| (m.to_string(), 1, 0, 1)));
    rows.extend(both.iter().map(|m| (m.to_string(), 1, 1, 1)));
    rows.extend(unrelated.iter().map(|m| (m.to_string(), 0, 0, 0)));
    rows
}

fn create_database(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE DisasterResponse (
             id INTEGER, message TEXT, original TEXT, genre TEXT,
             related INTEGER, water INTEGER, food INTEGER
         );",
    )
    .unwrap();
    for (i, (message, related, water, food)) in rows().into_iter().enumerate() {
        conn.execute(
            "INSERT INTO DisasterResponse VALUES (?1, ?2, NULL, 'direct', ?3, ?4, ?5)",
            params![i as i64, message, related, water, food],
        )
        .unwrap();
    }
}

fn create_csv(path: &Path) {
    let mut text = String::from("id,message,original,genre,related,water,food\n");
    for (i, (message, related, water, food)) in rows().into_iter().enumerate() {
        text.push_str(&format!("{i},{message},,direct,{related},{water},{food}\n"));
    }
    std::fs::write(path, text).unwrap();
}

fn small_config() -> TrainingConfig {
    TrainingConfig {
        cv_folds: 2,
        forest: ForestConfig {
            n_estimators: 10,
            ..Default::default()
        },
        grid: ParamGrid {
            min_samples_split: Some(vec![2, 4]),
            ..ParamGrid::empty()
        },
        ..Default::default()
    }
}

#[test]
fn test_sqlite_and_csv_load_the_same_corpus() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("DisasterResponse.db");
    let csv = dir.path().join("messages.csv");
    create_database(&db);
    create_csv(&csv);

    let layout = CorpusLayout::default();
    let from_db = load_corpus(&db, &layout).unwrap();
    let from_csv = load_corpus(&csv, &layout).unwrap();

    assert_eq!(from_db.len(), 20);
    assert_eq!(from_db.categories(), &CATEGORIES);
    assert_eq!(from_db, from_csv);
}

#[test]
fn test_train_evaluate_save_load() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("DisasterResponse.db");
    create_database(&db);

    let config = small_config();
    let corpus = load_corpus(&db, &config.corpus).unwrap();
    let (train, test) = corpus.train_test_split(config.test_size, config.seed).unwrap();
    assert_eq!((train.len(), test.len()), (16, 4));

    let model = TrainedModel::train(&train, &config).unwrap();
    assert_eq!(model.search_report().candidates.len(), 2);

    let reports = model.evaluate(&test).unwrap();
    let names: Vec<&str> = reports.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(names, CATEGORIES);
    for report in &reports {
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert!((0.0..=1.0).contains(&report.precision));
        assert!((0.0..=1.0).contains(&report.recall));
    }

    let path = dir.path().join("classifier.model");
    model.save(&path).unwrap();
    let restored = TrainedModel::load(&path).unwrap();

    assert_eq!(restored.categories(), model.categories());
    assert_eq!(restored.best_config(), model.best_config());
    assert_eq!(
        restored.predict_messages(test.messages()).unwrap(),
        model.predict_messages(test.messages()).unwrap()
    );
}

#[test]
fn test_training_is_reproducible() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("messages.csv");
    create_csv(&csv);

    let config = small_config();
    let corpus = load_corpus(&csv, &config.corpus).unwrap();
    let first = TrainedModel::train(&corpus, &config).unwrap();
    let second = TrainedModel::train(&corpus, &config).unwrap();

    let probe = ["need water", "food please", "nice weather", "hungry children"];
    assert_eq!(
        first.predict_messages(&probe).unwrap(),
        second.predict_messages(&probe).unwrap()
    );
}

#[test]
fn test_corrupted_model_file_is_rejected() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("messages.csv");
    create_csv(&csv);

    let config = small_config();
    let corpus = load_corpus(&csv, &config.corpus).unwrap();
    let model = TrainedModel::train(&corpus, &config).unwrap();

    let path = dir.path().join("classifier.model");
    model.save(&path).unwrap();
    let mut bytes = std::fs::read(&path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x55;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        TrainedModel::load(&path),
        Err(TriageError::Persistence(_))
    ));
}

#[test]
fn test_cli_training_run() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("DisasterResponse.db");
    let model_path = dir.path().join("classifier.model");
    create_database(&db);

    let args = match parse_train_args([
        "triage",
        db.to_str().unwrap(),
        model_path.to_str().unwrap(),
        "--quiet",
        "--n-estimators",
        "5",
        "--cv-folds",
        "2",
        "--jobs",
        "2",
    ]) {
        TrainInvocation::Run(args) => args,
        other => panic!("unexpected parse result {other:?}"),
    };

    let summary = execute_train(&args).unwrap();
    assert_eq!(summary.train_rows + summary.test_rows, 20);
    assert_eq!(summary.reports.len(), 3);
    assert!(model_path.exists());

    let model = TrainedModel::load(&model_path).unwrap();
    let classified = model.classify(&["we need water"]).unwrap();
    assert_eq!(classified.len(), 1);
}

#[test]
fn test_cli_bad_label_offset_fails_at_load() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("DisasterResponse.db");
    create_database(&db);

    let args = match parse_train_args([
        "triage",
        db.to_str().unwrap(),
        dir.path().join("classifier.model").to_str().unwrap(),
        "-q",
        "--label-offset",
        "7",
    ]) {
        TrainInvocation::Run(args) => args,
        other => panic!("unexpected parse result {other:?}"),
    };

    let error = execute_train(&args).unwrap_err();
    assert_eq!(error.stage(), Some(Stage::Load));
    assert!(error.to_string().starts_with("load stage failed: Data error"));
}
