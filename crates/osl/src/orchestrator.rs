//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where refresh was turned off for speed..."
//! 🎬 "One orchestrator swore to turn it back on."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 IngestionOrchestrator: disable refresh, load, re-enable refresh. In that order. Always.
//!
//! ```text
//!   Idle ──► RefreshDisabling ──► Loading ──► RefreshEnabling ──► Done
//!                  │                                  │
//!                  └────────────► Failed ◄────────────┘
//! ```
//!
//! 🧠 Knowledge graph:
//! - The page size is validated first. A bad one fails `Idle → Failed` with no request sent.
//! - Disabling refresh is the "acquire", re-enabling it is the "release".
//! - If the disable call fails, nothing else happens. No load without the optimization.
//! - Once loading starts, the release runs exactly once on the way out, whatever the load did.
//!   There is no `?` between the load and the release. That is the whole trick.
//! - Both failed? The load error is the headline, the release failure rides along.
//!
//! ⚠️ Known limitations: dropping the `ingest` future mid-load (or a panic in a caller's source
//! or observer) skips the release, since `Drop` can't await a request. Two processes loading the
//! same index will race on the refresh setting. Nobody coordinates.

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::generator::DocumentSource;
use crate::loader::{BulkLoader, LoadSummary, PagePlan};
use crate::progress::ProgressObserver;
use crate::settings::IndexSettingsController;

/// 🚦 Where an orchestrated load is right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Idle,
    RefreshDisabling,
    Loading,
    RefreshEnabling,
    Done,
    Failed,
}

/// 🔧 Knobs for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// 🔀 Turn refresh off for the load and back on afterwards. On by default.
    /// Off means the load runs against whatever refresh setting the index already has.
    pub toggle_refresh: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            toggle_refresh: true,
        }
    }
}

/// 📊 What a successful orchestrated load looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub index: String,
    pub documents_loaded: u64,
    /// ⚠️ Documents inside accepted pages that the engine refused item by item.
    pub documents_rejected: u64,
    /// 🗺️ Every state visited, starting from `Idle`.
    pub transitions: Vec<IngestState>,
}

/// 🎬 Sequences the settings controller and the bulk loader around one load.
#[derive(Debug)]
pub struct IngestionOrchestrator {
    settings: IndexSettingsController,
    loader: BulkLoader,
    options: IngestOptions,
    state: IngestState,
    transitions: Vec<IngestState>,
}

impl IngestionOrchestrator {
    pub fn new(
        settings: IndexSettingsController,
        loader: BulkLoader,
        options: IngestOptions,
    ) -> Self {
        Self {
            settings,
            loader,
            options,
            state: IngestState::Idle,
            transitions: vec![IngestState::Idle],
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// 🗺️ The states visited by the most recent run.
    pub fn transitions(&self) -> &[IngestState] {
        &self.transitions
    }

    fn transition(&mut self, next: IngestState) {
        debug!("🚦 ingest state: {:?} → {:?}", self.state, next);
        self.state = next;
        self.transitions.push(next);
    }

    /// 🚀 Run one full orchestrated load into the loader's index.
    pub async fn ingest<S: DocumentSource>(
        &mut self,
        total_count: u64,
        page_size: usize,
        source: &mut S,
        progress: &mut dyn ProgressObserver,
    ) -> Result<IngestReport> {
        let index = self.loader.index().to_string();
        self.state = IngestState::Idle;
        self.transitions = vec![IngestState::Idle];

        // 🔧 bad page size: refuse before a single request leaves, refresh included
        let plan = match PagePlan::new(total_count, page_size) {
            Ok(plan) => plan,
            Err(config_error) => {
                self.transition(IngestState::Failed);
                return Err(config_error);
            }
        };

        if !self.options.toggle_refresh {
            // -- 💤 no acquire, no release. Just the load.
            self.transition(IngestState::Loading);
            let load_result = self
                .loader
                .load_plan(plan, source, progress)
                .await;
            return match load_result {
                Ok(summary) => {
                    self.transition(IngestState::Done);
                    Ok(self.report(index, summary))
                }
                Err(load_error) => {
                    self.transition(IngestState::Failed);
                    Err(load_error)
                }
            };
        }

        // 🚫 acquire: refresh off
        self.transition(IngestState::RefreshDisabling);
        let disable_result = self.settings.disable_refresh(&index).await;
        if let Err(disable_error) = disable_result {
            error!(
                "💀 could not disable refresh on '{}', the load was not attempted: {}",
                index, disable_error
            );
            self.transition(IngestState::Failed);
            return Err(disable_error);
        }

        // 🚚 the load itself. Whatever comes out of here, we are going through the release.
        self.transition(IngestState::Loading);
        let load_result = self
            .loader
            .load_plan(plan, source, progress)
            .await;

        // ✅ release: refresh back on, exactly once, unconditionally
        self.transition(IngestState::RefreshEnabling);
        let enable_result = self.settings.enable_refresh(&index).await;

        match (load_result, enable_result) {
            (Ok(summary), Ok(_ack)) => {
                self.transition(IngestState::Done);
                info!(
                    "✅ loaded {} documents into '{}', refresh_interval restored to {}",
                    summary.submitted,
                    index,
                    self.settings.enabled_interval()
                );
                Ok(self.report(index, summary))
            }
            (Ok(summary), Err(enable_error)) => {
                self.transition(IngestState::Failed);
                error!(
                    "💀 {} documents loaded into '{}' but refresh could not be re-enabled: {}",
                    summary.submitted, index, enable_error
                );
                Err(Error::StateTransition {
                    index,
                    source: Box::new(enable_error),
                })
            }
            (Err(load_error), Ok(_ack)) => {
                self.transition(IngestState::Failed);
                Err(load_error)
            }
            (Err(load_error), Err(enable_error)) => {
                self.transition(IngestState::Failed);
                error!(
                    "💀 load into '{}' failed and refresh could not be re-enabled either: {}",
                    index, enable_error
                );
                Err(Error::LoadAndRestore {
                    index,
                    load: Box::new(load_error),
                    restore: Box::new(enable_error),
                })
            }
        }
    }

    fn report(&self, index: String, summary: LoadSummary) -> IngestReport {
        IngestReport {
            index,
            documents_loaded: summary.submitted,
            documents_rejected: summary.rejected,
            transitions: self.transitions.clone(),
        }
    }
}
