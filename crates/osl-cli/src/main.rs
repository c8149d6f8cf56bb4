//! 🚀 osl-cli: the front door, the bouncer, the maitre d' of osl.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads `.env` and config,
//! sets up logging, and then lets the library do the heavy lifting.
//! Like a manager. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osl::Command;
use osl::app_config::AppConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "osl")]
#[command(about = "Bulk-load documents into an OpenSearch index, then query them", long_about = None)]
struct Cli {
    /// 🔧 TOML config file. Used only if it exists; env vars fill in the rest.
    #[arg(long, default_value = "osl.toml", global = true)]
    config: PathBuf,

    /// 🏷️ Target index, overriding config
    #[arg(long, global = true)]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate fake documents and bulk-load them, with refresh off for the duration
    Ingest {
        /// How many documents to load
        #[arg(long)]
        count: Option<u64>,
        /// Documents per `_bulk` request
        #[arg(long)]
        page_size: Option<usize>,
        /// Leave refresh_interval alone during the load
        #[arg(long)]
        no_refresh_toggle: bool,
    },
    /// Run one filtered, sorted search and print the raw response
    Search {
        /// Lucene query-string filter, e.g. "Age:[10 TO 20]"
        #[arg(long)]
        filter: Option<String>,
        /// Sort key as <field>:<asc|desc>; repeat for more than one
        #[arg(long)]
        sort: Vec<String>,
        /// Maximum number of hits
        #[arg(long)]
        size: Option<usize>,
        /// Let the request cache answer
        #[arg(long)]
        use_cache: bool,
    },
    /// Create the index with bulk-friendly settings
    CreateIndex,
    /// Delete the index
    DeleteIndex,
    /// List indices on the cluster
    ListIndices,
}

impl Cli {
    /// 🔀 Fold command-line overrides into the loaded config and pick the command to run.
    fn apply(self, mut app_config: AppConfig) -> (AppConfig, Command) {
        if let Some(index) = self.index {
            app_config.index = index;
        }
        let command = match self.command {
            Commands::Ingest {
                count,
                page_size,
                no_refresh_toggle,
            } => {
                if let Some(count) = count {
                    app_config.ingest.total_count = count;
                }
                if let Some(page_size) = page_size {
                    app_config.ingest.page_size = page_size;
                }
                if no_refresh_toggle {
                    app_config.ingest.toggle_refresh = false;
                }
                Command::Ingest
            }
            Commands::Search {
                filter,
                sort,
                size,
                use_cache,
            } => {
                if let Some(filter) = filter {
                    app_config.query.filter = filter;
                }
                if !sort.is_empty() {
                    app_config.query.sort = sort;
                }
                if let Some(size) = size {
                    app_config.query.size = size;
                }
                if use_cache {
                    app_config.query.bypass_request_cache = false;
                }
                Command::Search
            }
            Commands::CreateIndex => Command::CreateIndex,
            Commands::DeleteIndex => Command::DeleteIndex,
            Commands::ListIndices => Command::ListIndices,
        };
        (app_config, command)
    }
}

/// 🚀 main(): where it all begins. The "I pressed F5 and held my breath" moment.
///
/// 🔧 Steps:
/// 1. `.env`, then tracing
/// 2. Parse args
/// 3. Load config, fold in the flags
/// 4. Run the thing, print what came back
/// 5. Handle errors (cry)
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 a missing .env is fine; the environment may already have everything
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // 🔒 Only hand figment the file if it's actually there
    let config_file = cli.config.clone();
    let config_file_that_exists = match config_file.try_exists().context(format!(
        "💀 Couldn't check whether the configuration file exists. If it's a pwd/cwd thing with \
         relative paths, use an absolute path. Was checking here: '{}'",
        config_file.display()
    ))? {
        true => Some(config_file.as_path()),
        false => None,
    };

    let app_config = osl::app_config::load_config(config_file_that_exists)
        .context("💀 In osl-cli, main, we couldn't load the configuration. Check the TOML file and the OPEN_SEARCH_* / OSL_* environment variables.")?;
    let (app_config, command) = cli.apply(app_config);

    let result = osl::run(app_config, command).await;

    match result {
        Ok(Some(output)) => {
            println!("{}", output);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion of sadness, one layer at a time
            let mut the_vibes_are_giving_connection_issues = false;
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
                let cause_str = cause.to_string();
                if cause_str.contains("error sending request")
                    || cause_str.contains("connection refused")
                    || cause_str.contains("Connection refused")
                    || cause_str.contains("tcp connect error")
                    || cause_str.contains("dns error")
                {
                    the_vibes_are_giving_connection_issues = true;
                }
            }

            if the_vibes_are_giving_connection_issues {
                error!(
                    "🔧 hint: looks like the cluster isn't reachable. \
                    Double-check OPEN_SEARCH_ENDPOINT (or [cluster] url) and that OpenSearch \
                    is actually running. If you're using Docker, try `docker ps` to see what's up. ☕"
                );
            }

            std::process::exit(1);
        }
    }
}
