//! 🔧 App Configuration: the sacred env-to-TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::lifecycle::IndexCreateSettings;
use crate::query::{QuerySpec, SortKey};
use crate::settings::DEFAULT_REFRESH_INTERVAL;
use crate::transport::ClusterConfig;

/// 🏷️ The index everything targets when nobody says otherwise.
pub const DEFAULT_INDEX: &str = "go-test-1";

/// 🗺️ The env names the cluster credentials have always lived under, and where they land.
const CLUSTER_ENV_ALIASES: [(&str, &str); 3] = [
    ("OPEN_SEARCH_ENDPOINT", "cluster.url"),
    ("OPEN_SEARCH_MASTER_USER_NAME", "cluster.username"),
    ("OPEN_SEARCH_MASTER_USER_PASSWORD", "cluster.password"),
];

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub create_index: IndexCreateSettings,
}

fn default_index() -> String {
    DEFAULT_INDEX.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            cluster: ClusterConfig::default(),
            ingest: IngestConfig::default(),
            query: QueryConfig::default(),
            create_index: IndexCreateSettings::default(),
        }
    }
}

/// 📦 How big, how chunky, and whether to flip refresh around the load.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    #[serde(default = "default_total_count")]
    pub total_count: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_true")]
    pub toggle_refresh: bool,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,
    /// 🎲 Same seed, same fake documents. Unset means fresh chaos every run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

fn default_total_count() -> u64 {
    10_000
}

fn default_page_size() -> usize {
    500
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval() -> String {
    DEFAULT_REFRESH_INTERVAL.to_string()
}

fn default_max_tags() -> usize {
    20
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            total_count: default_total_count(),
            page_size: default_page_size(),
            toggle_refresh: true,
            refresh_interval: default_refresh_interval(),
            seed: None,
            max_tags: default_max_tags(),
        }
    }
}

/// 🔎 The search the `search` command runs when you don't override anything.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_sort")]
    pub sort: Vec<String>,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_true")]
    pub bypass_request_cache: bool,
}

fn default_filter() -> String {
    "Age:[10 TO 20]".to_string()
}

fn default_sort() -> Vec<String> {
    vec!["Age:asc".to_string()]
}

fn default_size() -> usize {
    3
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            sort: default_sort(),
            size: default_size(),
            bypass_request_cache: true,
        }
    }
}

impl QueryConfig {
    /// 🔀 Parse the sort strings into a [`QuerySpec`]. A malformed key is a configuration error.
    pub fn to_query_spec(&self) -> Result<QuerySpec> {
        let sort = self
            .sort
            .iter()
            .map(|raw| raw.parse::<SortKey>())
            .collect::<Result<Vec<_>>>()?;
        Ok(QuerySpec::new(
            self.filter.clone(),
            sort,
            self.size,
            self.bypass_request_cache,
        ))
    }
}

/// 🚀 Load the config: from env vars, from a file, or from the sheer power of defaults.
///
/// 📐 Layering, lowest to highest:
///   1. `OPEN_SEARCH_ENDPOINT` / `OPEN_SEARCH_MASTER_USER_NAME` / `OPEN_SEARCH_MASTER_USER_PASSWORD`
///   2. `OSL_*`, nested on `__` (`OSL_INGEST__PAGE_SIZE=250`)
///   3. the TOML file, if one was given. TOML wins on conflicts.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let aliased_names = CLUSTER_ENV_ALIASES.map(|(env_name, _)| env_name);
    let config = Figment::new()
        .merge(Env::raw().only(&aliased_names).map(|key| {
            CLUSTER_ENV_ALIASES
                .iter()
                .find(|(env_name, _)| key.as_str().eq_ignore_ascii_case(env_name))
                .map(|(_, config_key)| (*config_key).into())
                .unwrap_or_else(|| key.into())
        }))
        .merge(Env::prefixed("OSL_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables \
             (OPEN_SEARCH_*, OSL_*). The file exists in our hearts, but apparently not on disk.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (OPEN_SEARCH_*, OSL_*). \
                 No file was provided, so this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use figment::Jail;
    use std::io::Write;

    #[test]
    fn the_one_where_nothing_is_configured_and_defaults_carry_the_team() {
        Jail::expect_with(|_jail| {
            let app_config = load_config(None)
                .expect("💀 An empty environment should still produce a config.");

            assert_eq!(app_config.index, "go-test-1");
            assert_eq!(app_config.ingest, IngestConfig::default());
            assert_eq!(app_config.ingest.total_count, 10_000);
            assert_eq!(app_config.ingest.page_size, 500);
            assert_eq!(app_config.query.filter, "Age:[10 TO 20]");
            assert_eq!(app_config.create_index, IndexCreateSettings::default());
            assert_eq!(app_config.cluster.connect_timeout_secs, 10);
            Ok(())
        });
    }

    #[test]
    fn the_one_where_the_old_env_names_still_find_their_way_home() {
        Jail::expect_with(|jail| {
            jail.set_env("OPEN_SEARCH_ENDPOINT", "https://search.example.com:9200");
            jail.set_env("OPEN_SEARCH_MASTER_USER_NAME", "admin");
            jail.set_env("OPEN_SEARCH_MASTER_USER_PASSWORD", "hunter-two");
            jail.set_env("OSL_INGEST__PAGE_SIZE", "250");
            jail.set_env("OSL_INDEX", "people");

            let app_config = load_config(None).expect("💀 Env-only config should parse.");

            assert_eq!(app_config.cluster.url, "https://search.example.com:9200");
            assert_eq!(app_config.cluster.username.as_deref(), Some("admin"));
            assert_eq!(app_config.cluster.password.as_deref(), Some("hunter-two"));
            assert_eq!(app_config.ingest.page_size, 250);
            assert_eq!(app_config.index, "people");
            Ok(())
        });
    }

    #[test]
    fn the_one_where_the_toml_file_outranks_the_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("OSL_INGEST__PAGE_SIZE", "250");
            jail.create_file(
                "osl.toml",
                r#"
                index = "from-the-file"

                [cluster]
                url = "http://localhost:9200"
                api_key = "c2VjcmV0"

                [ingest]
                page_size = 1000
                toggle_refresh = false
                seed = 7

                [query]
                sort = ["Height:desc", "Age:asc"]
                bypass_request_cache = false
                "#,
            )?;

            let app_config = load_config(Some(Path::new("osl.toml")))
                .expect("💀 The TOML file should parse. The schema drift goblin does not get this win.");

            assert_eq!(app_config.index, "from-the-file");
            assert_eq!(app_config.ingest.page_size, 1000);
            assert!(!app_config.ingest.toggle_refresh);
            assert_eq!(app_config.ingest.seed, Some(7));
            assert_eq!(app_config.cluster.api_key.as_deref(), Some("c2VjcmV0"));
            assert_eq!(app_config.query.sort, vec!["Height:desc", "Age:asc"]);
            // -- untouched sections keep their defaults
            assert_eq!(app_config.query.size, 3);
            assert_eq!(app_config.create_index.number_of_shards, 1);
            Ok(())
        });
    }

    #[test]
    fn the_one_where_a_tempfile_config_sets_the_index_blueprint() -> anyhow::Result<()> {
        let mut config_file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        write!(
            config_file,
            r#"
            [create_index]
            number_of_shards = 3
            number_of_replicas = 1
            "#
        )?;

        let app_config: AppConfig = Figment::new()
            .merge(Toml::file(config_file.path()))
            .extract()?;

        assert_eq!(app_config.create_index.number_of_shards, 3);
        assert_eq!(app_config.create_index.number_of_replicas, 1);
        assert_eq!(app_config.create_index.refresh_interval, "-1");
        Ok(())
    }

    #[test]
    fn the_one_where_a_bad_sort_key_is_caught_before_any_request() -> Result<()> {
        let good = QueryConfig::default().to_query_spec()?;
        assert_eq!(good.sort(), &[SortKey::asc("Age")]);
        assert_eq!(good.size(), 3);
        assert!(good.bypass_request_cache());

        let bad = QueryConfig {
            sort: vec!["Age".to_string()],
            ..QueryConfig::default()
        };
        assert!(matches!(bad.to_query_spec(), Err(Error::Configuration(_))));
        Ok(())
    }

    #[test]
    fn the_one_where_a_garbled_file_gets_a_helpful_obituary() {
        Jail::expect_with(|jail| {
            jail.create_file("broken.toml", "[ingest]\npage_size = \"lots\"\n")?;

            let err = load_config(Some(Path::new("broken.toml")))
                .expect_err("💀 A string page size should not parse.");
            assert!(err.to_string().contains("broken.toml"));
            Ok(())
        });
    }
}
