//! Command implementations for the Triage CLI.

use std::io;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::TrainingConfig;
use crate::corpus::load_corpus;
use crate::error::{Result, Stage, TriageError};
use crate::ml::search::GridSearch;
use crate::pipeline::TrainedModel;

/// Build the worker pool every parallel step runs on.
pub fn build_thread_pool(jobs: Option<usize>) -> Result<ThreadPool> {
    let threads = jobs.unwrap_or_else(num_cpus::get);
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("triage-worker-{i}"))
        .build()
        .map_err(|e| TriageError::configuration(format!("Failed to create thread pool: {e}")))
}

/// Load, build, train, evaluate and save, in that order.
pub fn execute_train(args: &TrainArgs) -> Result<TrainingSummary> {
    let config = args.training_config()?;
    let pool = build_thread_pool(config.jobs)?;
    log::debug!("Running on {} worker threads", pool.current_num_threads());

    let summary = pool.install(|| run_training(args, &config))?;
    if args.output_format == OutputFormat::Json {
        output_json(&summary)?;
    }
    Ok(summary)
}

fn run_training(args: &TrainArgs, config: &TrainingConfig) -> Result<TrainingSummary> {
    let start_time = Instant::now();
    let reporter = StageReporter::new(args.output_format, args.verbosity());
    let human = args.output_format == OutputFormat::Human;

    reporter.stage(&format!(
        "Loading data...\n    DATABASE: {}",
        args.database.display()
    ));
    let (train, test) = load_corpus(&args.database, &config.corpus)
        .and_then(|corpus| corpus.train_test_split(config.test_size, config.seed))
        .map_err(|e| e.at_stage(Stage::Load))?;
    log::info!("Split into {} training and {} test rows", train.len(), test.len());

    reporter.stage("Building model...");
    let n_candidates = config
        .validate()
        .and_then(|_| GridSearch::new(config.base_forest(), config.grid.clone()).n_candidates())
        .map_err(|e| e.at_stage(Stage::Build))?;
    log::info!(
        "Searching {n_candidates} candidates with {}-fold cross-validation",
        config.cv_folds
    );

    reporter.stage("Training model...");
    let model = TrainedModel::train(&train, config).map_err(|e| e.at_stage(Stage::Train))?;
    if human && args.verbosity() > 1 {
        write_search_summary(&mut io::stdout().lock(), model.search_report())?;
    }

    reporter.stage("Evaluating model...");
    let reports = model.evaluate(&test).map_err(|e| e.at_stage(Stage::Evaluate))?;
    if human {
        write_reports(&mut io::stdout().lock(), &reports)?;
    }

    reporter.stage(&format!(
        "Saving model...\n    MODEL: {}",
        args.model.display()
    ));
    model
        .save(&args.model)
        .map_err(|e| e.at_stage(Stage::Save))?;
    reporter.stage("Trained model saved!");

    Ok(TrainingSummary {
        database: args.database.display().to_string(),
        model: args.model.display().to_string(),
        train_rows: train.len(),
        test_rows: test.len(),
        categories: model.categories().to_vec(),
        best_params: model.search_report().best().describe(),
        search: model.search_report().clone(),
        reports,
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}

/// Load a model and print the categories predicted for each message.
pub fn execute_classify(args: &ClassifyArgs) -> Result<ClassificationResults> {
    let model = TrainedModel::load(&args.model)?;
    log::info!(
        "Loaded model with {} categories (trained {} by version {})",
        model.categories().len(),
        model.trained_at().to_rfc3339(),
        model.version()
    );

    let predicted = model.classify(&args.messages)?;
    let results = ClassificationResults {
        model: args.model.display().to_string(),
        results: args
            .messages
            .iter()
            .zip(predicted)
            .map(|(message, categories)| MessageClassification {
                message: message.clone(),
                categories: categories.into_iter().map(String::from).collect(),
            })
            .collect(),
    };

    match args.output_format {
        OutputFormat::Human => write_classifications(&mut io::stdout().lock(), &results)?,
        OutputFormat::Json => output_json(&results)?,
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_size() {
        let pool = build_thread_pool(Some(2)).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert!(build_thread_pool(None).unwrap().current_num_threads() >= 1);
    }

    #[test]
    fn test_load_failure_is_tagged() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = match parse_train_args([
            "triage",
            dir.path().join("absent.csv").to_str().unwrap(),
            dir.path().join("out.model").to_str().unwrap(),
            "-q",
        ]) {
            TrainInvocation::Run(args) => args,
            other => panic!("unexpected parse result {other:?}"),
        };

        let error = execute_train(&args).unwrap_err();
        assert_eq!(error.stage(), Some(Stage::Load));
        assert!(!dir.path().join("out.model").exists());
    }
}
