use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use formcast::config::Config;
use formcast::csv::CsvWriter;
use formcast::dataset::{build_training_dataset, write_training_csv};
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

    /// JSON file overriding the default numeric policies
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// CSV file to write the labelled table to
    #[clap(short = 'o', long)]
    out: PathBuf,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.dir.is_dir() {
            bail!("{:?} is not a directory", self.dir);
        }
        if self.start < 2 {
            bail!("the first target round must have at least one round of history");
        }
        if self.start > self.end {
            bail!("start round {} is after end round {}", self.start, self.end);
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

    let summary = print::tabulate_dataset(&rows);
    info!("rows per round:\n{}", Console::default().render(&summary));

    let mut writer = CsvWriter::create(&args.out)?;
    write_training_csv(&rows, &mut writer)?;
    info!("wrote {} rows to {:?}", rows.len(), args.out);
    Ok(())
}
