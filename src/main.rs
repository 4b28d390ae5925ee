use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pathpatrol_worker::config::Config;
use pathpatrol_worker::fetch::HttpNetwork;
use pathpatrol_worker::lifecycle::Lifecycle;
use pathpatrol_worker::store::{CacheStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "pathpatrol-worker")]
#[command(about = "Offline cache controller for the PathPatrol PWA")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pathpatrol/worker.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Precache the application shell into the current versioned store
  Install,
  /// Delete superseded stores, keeping only the current version
  Activate,
  /// List every store and its entry count
  Status,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let store = SqliteStore::open()?;

  match args.command {
    Command::Install => {
      let network = HttpNetwork::new(&config)?;
      let mut lifecycle = Lifecycle::new();
      lifecycle.install(&config, &network, &store).await?;
      println!(
        "Installed {} ({} resources precached)",
        config.cache_name,
        config.precache.len()
      );
    }
    Command::Activate => {
      let mut lifecycle = Lifecycle::new();
      lifecycle.activate(&config, &store).await?;
      println!("Active store: {}", config.cache_name);
    }
    Command::Status => {
      let stores = store.list_stores().await?;
      if stores.is_empty() {
        println!("No stores yet. Run `pathpatrol-worker install` first.");
      }
      for name in stores {
        let entries = store.keys(&name).await?.len();
        let marker = if name == config.cache_name {
          " (current)"
        } else {
          ""
        };
        println!("{}: {} entries{}", name, entries, marker);
      }
    }
  }

  Ok(())
}
