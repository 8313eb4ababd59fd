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
use formcast::csv::CsvWriter;
use formcast::dataset::build_inference_table;
use formcast::domain::Position;
use formcast::model::{rank, ModelSet};
use formcast::print;
use formcast::source::{CsvDirSource, Memoized};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// directory holding the per-round GW<n> snapshot folders
    #[clap(short = 'd', long)]
    dir: PathBuf,

    /// the most recently completed round; projections are for the round after
    #[clap(short = 'r', long)]
    round: u32,

    /// JSON file overriding the default numeric policies
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// only print this position (GKP, DEF, MID or FWD)
    #[clap(short = 'p', long)]
    position: Option<Position>,

    /// number of players to print per position
    #[clap(short = 'n', long, default_value = "20")]
    top: usize,

    /// write every ranked projection to a CSV file
    #[clap(short = 'o', long)]
    out: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.dir.is_dir() {
            bail!("{:?} is not a directory", self.dir);
        }
        if self.top == 0 {
            bail!("at least one player must be printed per position");
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
    let rows = build_inference_table(&mut source, args.round, &config)?;
    if rows.is_empty() {
        warn!("no projectable players for round {}", args.round + 1);
        return Ok(());
    }

    let ranked = rank(
        &rows,
        &ModelSet::heuristic(&config.projection),
        &config.dampening,
    )?;
    info!("projected {} players for round {}", ranked.len(), args.round + 1);

    for position in Position::iter() {
        if args.position.is_some_and(|only| only != position) {
            continue;
        }
        let top = ranked
            .iter()
            .filter(|prediction| prediction.position == position)
            .take(args.top)
            .cloned()
            .collect::<Vec<_>>();
        let table = print::tabulate_predictions(&top);
        println!("{position}:\n{}", Console::default().render(&table));
    }

    if let Some(out) = &args.out {
        let mut writer = CsvWriter::create(out)?;
        writer.append([
            "player_id",
            "name",
            "position",
            "team_id",
            "target_round",
            "raw_score",
            "predicted_points",
            "low_confidence",
        ])?;
        for prediction in &ranked {
            writer.append([
                prediction.player_id.to_string(),
                prediction.name.clone(),
                prediction.position.code().to_string(),
                prediction.team_id.to_string(),
                prediction.target_round.to_string(),
                prediction.raw_score.to_string(),
                prediction.predicted_points.to_string(),
                prediction.low_confidence.to_string(),
            ])?;
        }
        writer.flush()?;
        info!("wrote {} projections to {out:?}", ranked.len());
    }
    Ok(())
}
