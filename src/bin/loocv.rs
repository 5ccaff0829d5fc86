//! LOOCV tool: tune one elastic distance on a UCR training split by
//! leave-one-out 1-NN, then score the selected parameter on the test split.
//! Writes a single JSON record per run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use elastica_classify::{
    evaluate_1nn, loocv, AdtwPenaltyFamily, CancelToken, DtwWindowFamily, LoocvFamily,
};
use elastica_data::{derive, Dataset};
use elastica_io::{
    read_ts_file, write_json, DatasetInfo, DistanceReport, LoocvRunReport, PhaseReport,
    RunStatus, SplitInfo, TsFile,
};

#[derive(Parser)]
#[command(name = "loocv")]
#[command(about = "Leave-one-out 1-NN parameter selection over a UCR dataset")]
#[command(version)]
struct Cli {
    /// Path to the UCR archive root
    ucr_path: PathBuf,

    /// Dataset name (directory under the archive root)
    dataset_name: String,

    /// Series representation: raw or derivative
    transform: String,

    /// Distance with optional cost exponent: ADTW[:cfe] or DTW[:cfe]
    distance: String,

    /// Number of worker threads (0 = auto-detect)
    nbthreads: usize,

    /// Where to write the JSON record
    output: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Summary of a split as it sits on disk, before dataset validation.
fn split_info(file: &TsFile) -> SplitInfo {
    let mut labels: Vec<&str> = file.labels.iter().map(String::as_str).collect();
    labels.sort_unstable();
    labels.dedup();
    SplitInfo {
        size: file.series.len(),
        nb_classes: labels.len(),
        length_min: file.series.iter().map(|s| s.len()).min().unwrap_or(0),
        length_max: file.series.iter().map(|s| s.len()).max().unwrap_or(0),
        dim: file.series.first().map_or(1, |s| s.dim()),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let dir = cli.ucr_path.join(&cli.dataset_name);
    let train_file = read_ts_file(&dir.join(format!("{}_TRAIN.ts", cli.dataset_name)))?;
    let test_file = read_ts_file(&dir.join(format!("{}_TEST.ts", cli.dataset_name)))?;

    let dataset = DatasetInfo {
        name: cli.dataset_name.clone(),
        train: split_info(&train_file),
        test: split_info(&test_file),
    };

    // Train/test consistency failures are a property of the dataset, not of
    // the run: record them in the JSON output and finish normally.
    let assembled = Dataset::new(train_file.series, train_file.labels).and_then(|train| {
        let test = Dataset::with_encoder(
            test_file.series,
            test_file.labels,
            train.header().label_names(),
        )?;
        Ok((train, test))
    });
    let (train, test) = match assembled {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("dataset check failed: {e}");
            let report = LoocvRunReport::error(dataset, e.to_string());
            write_json(&cli.output, &report)?;
            return Ok(());
        }
    };

    let (train, test): (Dataset, Dataset) = match cli.transform.as_str() {
        "raw" => (train, test),
        "derivative" => (train.map_series(derive), test.map_series(derive)),
        other => bail!("unknown transform \"{other}\" (expected raw or derivative)"),
    };

    // <distance>[:<cfe>], cost exponent defaulting to 1.
    let mut parts = cli.distance.split(':');
    let name = parts.next().unwrap_or("");
    let cfe: f64 = parts
        .next()
        .map(str::parse)
        .transpose()
        .context("<distance:cfe>: cfe must be a number")?
        .unwrap_or(1.0);

    let mut rng = ChaCha8Rng::from_entropy();
    let cancel = CancelToken::new();
    let train_seed: u64 = rng.gen();
    let test_seed: u64 = rng.gen();

    let (train_result, instance, selected_index, selected_param) = match name {
        "DTW" => {
            let family = DtwWindowFamily::new(cfe, train.header().length_max())?;
            let result = loocv(&family, &train, train_seed, cli.nbthreads, &cancel)?;
            let k = result.best_index;
            let window = family.window(k);
            (result, family.instance(k), k, window as f64)
        }
        "ADTW" => {
            let family = AdtwPenaltyFamily::sampled(&train, cfe, &mut rng)?;
            let result = loocv(&family, &train, train_seed, cli.nbthreads, &cancel)?;
            let k = result.best_index;
            let penalty = family.penalty(k);
            (result, family.instance(k), k, penalty)
        }
        other => bail!("unknown distance \"{other}\" (expected ADTW or DTW)"),
    };

    let test_result = evaluate_1nn(&train, &test, &instance, test_seed, cli.nbthreads, &cancel)?;

    let loocv_train = PhaseReport::new(
        train_result.nb_correct[selected_index],
        train.len(),
        train_result.time,
    );
    let loocv_test = PhaseReport::new(test_result.nb_correct, test.len(), test_result.time);

    println!(
        "{} LOOCV result: {}/{} = {:.4}  ({})",
        cli.dataset_name, loocv_train.nb_correct, loocv_train.total, loocv_train.accuracy,
        loocv_train.time
    );
    println!(
        "{} NN1 test result: {}/{} = {:.4}  ({})",
        cli.dataset_name, loocv_test.nb_correct, loocv_test.total, loocv_test.accuracy,
        loocv_test.time
    );

    let report = LoocvRunReport {
        dataset,
        status: RunStatus::Success,
        status_message: None,
        distance: Some(DistanceReport {
            name: instance.name(),
            selected_index,
            selected_param,
        }),
        loocv_train: Some(loocv_train),
        loocv_test: Some(loocv_test),
    };
    write_json(&cli.output, &report)?;
    info!(output = %cli.output.display(), "run complete");
    Ok(())
}
