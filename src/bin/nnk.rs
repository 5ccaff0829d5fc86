//! k-NN classification of a UCR dataset under one parameterised distance,
//! with optional normalisation and derivative transforms.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use elastica_classify::{evaluate_knn, CancelToken};
use elastica_data::{derive, meannorm, minmax, unitlength, zscore, Dataset};
use elastica_dist::{DistanceInstance, Elastic};
use elastica_io::{
    load_ucr_pair, write_json, DatasetInfo, NnkRunReport, PhaseReport, RunStatus, SplitInfo,
};

#[derive(Parser)]
#[command(name = "nnk")]
#[command(about = "Time series k-NN classification over the UCR archive (univariate)")]
#[command(version)]
struct Cli {
    /// <ucr path>:<dataset name>, e.g. /data/Univariate_ts:Adiac
    #[arg(short = 'p', long = "problem")]
    problem: String,

    /// Distance specification, e.g. dtw:2:10, adtw:2:0.5, wdtw:2:0.25,
    /// erp:2:0.5:-1, lcss:0.1:5, msm:0.5, twe:2:0.001:0.25,
    /// modminkowski:2, lorentzian (negative window = unconstrained)
    #[arg(short = 'd', long = "distance")]
    distance: String,

    /// Normalisation applied first: meannorm, minmax[:min:max], unitlength,
    /// zscore
    #[arg(short = 'n', long = "normalisation")]
    normalisation: Option<String>,

    /// Transform applied after normalisation: derivative[:degree]
    #[arg(short = 't', long = "transform")]
    transform: Option<String>,

    /// Number of neighbours
    #[arg(short = 'k', default_value_t = 1)]
    k: usize,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short = 'e', long = "threads", default_value_t = 0)]
    threads: usize,

    /// Seed of randomness; negative draws one from the system
    #[arg(short = 's', long = "seed", default_value_t = -1, allow_hyphen_values = true)]
    seed: i64,

    /// Where to write the JSON record; stdout summary only when absent
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,
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

fn run(cli: &Cli) -> Result<()> {
    if cli.k == 0 {
        bail!("-k must be at least 1");
    }
    let (ucr_path, dataset_name) = cli
        .problem
        .rsplit_once(':')
        .context("-p expects <ucr path>:<dataset name>")?;

    let pair = load_ucr_pair(std::path::Path::new(ucr_path), dataset_name)?;
    let mut train = pair.train;
    let mut test = pair.test;

    // Normalisation, then transform, matching the order of the data pipeline.
    let norm_name = cli.normalisation.as_deref().unwrap_or("default");
    (train, test) = apply_normalisation(norm_name, train, test)?;

    let transform_name = cli.transform.as_deref().unwrap_or("default");
    (train, test) = apply_transform(transform_name, train, test)?;

    let elastic = Elastic::parse(&cli.distance)?;
    let length_max = train
        .header()
        .length_max()
        .max(test.header().length_max());
    let instance = DistanceInstance::new(elastic, length_max)?;

    let seed: u64 = if cli.seed < 0 {
        ChaCha8Rng::from_entropy().gen()
    } else {
        cli.seed as u64
    };

    let cancel = CancelToken::new();
    let result = evaluate_knn(&train, &test, &instance, cli.k, seed, cli.threads, &cancel)?;
    let phase = PhaseReport::new(result.nb_correct, test.len(), result.time);

    println!(
        "{dataset_name} NN{} result: {}/{} = {:.4}  ({})",
        cli.k, phase.nb_correct, phase.total, phase.accuracy, phase.time
    );

    if let Some(out) = &cli.out {
        let report = NnkRunReport {
            dataset: DatasetInfo {
                name: dataset_name.to_string(),
                train: SplitInfo::from_header(train.header()),
                test: SplitInfo::from_header(test.header()),
            },
            status: RunStatus::Success,
            status_message: None,
            distance: instance.name(),
            normalisation: norm_name.to_string(),
            transform: transform_name.to_string(),
            k: cli.k,
            seed,
            result: Some(phase),
        };
        write_json(out, &report)?;
    }
    Ok(())
}

fn apply_normalisation(
    spec: &str,
    train: Dataset,
    test: Dataset,
) -> Result<(Dataset, Dataset)> {
    let v: Vec<&str> = spec.split(':').collect();
    match v.as_slice() {
        ["default"] => Ok((train, test)),
        ["meannorm"] => Ok((train.map_series(meannorm), test.map_series(meannorm))),
        ["unitlength"] => Ok((train.map_series(unitlength), test.map_series(unitlength))),
        ["zscore"] => Ok((train.map_series(zscore), test.map_series(zscore))),
        ["minmax"] => Ok((
            train.map_series(|s| minmax(s, 0.0, 1.0)),
            test.map_series(|s| minmax(s, 0.0, 1.0)),
        )),
        ["minmax", lo, hi] => {
            let lo: f64 = lo.parse().context("minmax: bad lower bound")?;
            let hi: f64 = hi.parse().context("minmax: bad upper bound")?;
            if !(lo < hi) {
                bail!("minmax: lower bound must be below upper bound");
            }
            Ok((
                train.map_series(|s| minmax(s, lo, hi)),
                test.map_series(|s| minmax(s, lo, hi)),
            ))
        }
        _ => bail!("unknown normalisation \"{spec}\""),
    }
}

fn apply_transform(spec: &str, train: Dataset, test: Dataset) -> Result<(Dataset, Dataset)> {
    let v: Vec<&str> = spec.split(':').collect();
    let degree = match v.as_slice() {
        ["default"] => 0usize,
        ["derivative"] => 1,
        ["derivative", d] => d.parse().context("derivative: bad degree")?,
        _ => bail!("unknown transform \"{spec}\""),
    };
    let mut train = train;
    let mut test = test;
    for _ in 0..degree {
        train = train.map_series(derive);
        test = test.map_series(derive);
    }
    Ok((train, test))
}
