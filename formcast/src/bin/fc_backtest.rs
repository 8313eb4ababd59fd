use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use formcast::config::Config;
use formcast::dataset::build_training_dataset;
use formcast::domain::Position;
use formcast::eval::{rolling_folds, time_split, Metrics, Split};
use formcast::feature::{feature_mask, TrainingRow};
use formcast::model::{predict_all, Calibrator, Heuristic, LinearBaseline, PointModel};
use formcast::print;
use formcast::source::{CsvDirSource, Memoized};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// directory holding the per-round GW<n> snapshot folders
    #[clap(short = 'd', long)]
    dir: PathBuf,

    /// first target round
    #[clap(short = 's', long, default_value = "2")]
    start: u32,

    /// last target round (inclusive)
    #[clap(short = 'e', long)]
    end: u32,

    /// last target round used for training; later rounds validate
    #[clap(short = 't', long = "train-end")]
    train_end: u32,

    /// JSON file overriding the default numeric policies
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// also evaluate expanding-window folds over the validation rounds
    #[clap(long)]
    folds: bool,

    /// print the fitted coefficients of each position's baseline
    #[clap(short = 'v', long)]
    verbose: bool,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.dir.is_dir() {
            bail!("{:?} is not a directory", self.dir);
        }
        if self.start < 2 {
            bail!("the first target round must have at least one round of history");
        }
        if !(self.start..self.end).contains(&self.train_end) {
            bail!(
                "training must end within {}..{} to leave a validation round",
                self.start,
                self.end
            );
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let config = match &args.config {
        None => Config::default(),
        Some(path) => Config::from_json_file(path)?,
    };
    let mut source = Memoized::new(CsvDirSource::new(&args.dir));
    let rows = build_training_dataset(&mut source, args.start, args.end, &config)?;
    let heuristic = Heuristic {
        config: config.projection.clone(),
    };

    let split = time_split(&rows, args.train_end)?;
    let comparison = compare(&split, &heuristic, args.verbose)?;
    println!(
        "Trained to round {}, validated on rounds {}..={}:\n{}",
        args.train_end,
        args.train_end + 1,
        args.end,
        Console::default().render(&print::tabulate_metrics(&comparison))
    );

    if args.folds {
        let mut fold_metrics = vec![];
        for fold in rolling_folds(&rows, args.train_end + 1, args.end) {
            for (label, metrics) in compare(&fold.split, &heuristic, false)? {
                fold_metrics.push((format!("GW{} {label}", fold.validation_round), metrics));
            }
        }
        println!(
            "Expanding-window folds:\n{}",
            Console::default().render(&print::tabulate_metrics(&fold_metrics))
        );
    }
    Ok(())
}

/// Validation metrics of the heuristic, the calibrated heuristic and per-position linear
/// baselines, pooled over all positions.
fn compare(
    split: &Split,
    heuristic: &Heuristic,
    verbose: bool,
) -> Result<Vec<(String, Metrics)>, Box<dyn Error>> {
    let actual = split
        .validation
        .iter()
        .map(|row| row.target_points)
        .collect::<Vec<_>>();

    let heuristic_train = predict_all(heuristic, split.train.iter().map(|row| &row.features))?;
    let heuristic_validation =
        predict_all(heuristic, split.validation.iter().map(|row| &row.features))?;
    let train_actual = split
        .train
        .iter()
        .map(|row| row.target_points)
        .collect::<Vec<_>>();
    let calibrator = Calibrator::fit(&heuristic_train, &train_actual)?;
    info!(
        "heuristic calibration: intercept {:.3}, slope {:.3}",
        calibrator.intercept, calibrator.slope
    );
    let calibrated = heuristic_validation
        .iter()
        .map(|&raw| calibrator.apply(raw))
        .collect::<Vec<_>>();

    let mut linear_actual = vec![];
    let mut linear_predicted = vec![];
    for position in Position::iter() {
        let train = of_position(&split.train, position);
        let validation = of_position(&split.validation, position);
        if validation.is_empty() {
            continue;
        }
        let baseline = match LinearBaseline::fit(train.iter().copied(), feature_mask(position)) {
            Ok(baseline) => baseline,
            Err(err) => {
                warn!("no linear baseline for {position}: {err}");
                continue;
            }
        };
        if verbose {
            println!(
                "{position} baseline (R² {:.3}, adjusted {:.3}):\n{}",
                baseline.r_squared,
                baseline.r_squared_adj,
                Console::default().render(&print::tabulate_baseline(&baseline))
            );
        }
        linear_predicted.extend(predict_all(
            &baseline,
            validation.iter().map(|row| &row.features),
        )?);
        linear_actual.extend(validation.iter().map(|row| row.target_points));
    }

    let mut metrics = vec![
        (
            heuristic.name().to_string(),
            Metrics::compute(&heuristic_validation, &actual)?,
        ),
        (
            format!("{} (calibrated)", heuristic.name()),
            Metrics::compute(&calibrated, &actual)?,
        ),
    ];
    if !linear_predicted.is_empty() {
        metrics.push((
            "linear".to_string(),
            Metrics::compute(&linear_predicted, &linear_actual)?,
        ));
    }
    Ok(metrics)
}

fn of_position<'a>(rows: &[&'a TrainingRow], position: Position) -> Vec<&'a TrainingRow> {
    rows.iter()
        .copied()
        .filter(|row| row.features.position == position)
        .collect()
}
