//! orgsync binary.
//!
//! Reads a JSON export of already-fetched connector records, runs the sync
//! pipeline, and writes the anonymized, deduplicated dataset as JSON.
//!
//! ```
//! orgsync --config orgsync.toml --input export.json --output dataset.json
//! ```

use std::{
  fs::File,
  io::{self, BufReader, BufWriter, Write as _},
  path::PathBuf,
};

use anyhow::Context as _;
use clap::Parser;
use orgsync_pipeline::{SyncConfig, SyncContext, SyncInput};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Canonicalize an org-graph export")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// JSON file with `employees` and `interactions` records.
  #[arg(short, long)]
  input: PathBuf,

  /// Where to write the dataset; stdout when omitted.
  #[arg(short, long)]
  output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays valid JSON.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = SyncConfig::load(cli.config.as_deref())
    .context("failed to load configuration")?;
  tracing::debug!(?config, "configuration loaded");
  let context =
    SyncContext::from_config(&config).context("invalid configuration")?;

  let file = File::open(&cli.input)
    .with_context(|| format!("failed to open {:?}", cli.input))?;
  let input = SyncInput::from_reader(BufReader::new(file))
    .with_context(|| format!("failed to parse {:?}", cli.input))?;

  let output = orgsync_pipeline::run(&context, input).context("sync failed")?;

  match &cli.output {
    Some(path) => {
      let file = File::create(path)
        .with_context(|| format!("failed to create {path:?}"))?;
      let mut writer = BufWriter::new(file);
      output.to_writer(&mut writer)?;
      writer.flush()?;
      tracing::info!("wrote dataset to {path:?}");
    }
    None => output.to_writer(io::stdout().lock())?,
  }

  Ok(())
}
