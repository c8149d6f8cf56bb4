//! 💀 Error types: every way a bulk load can go sideways, with names.
//!
//! 🧠 Knowledge graph:
//! - `Configuration`: we refused before touching the network. Cheapest failure there is.
//! - `Encoding`: serde looked at a document and said no.
//! - `Transport`: the network said no. reqwest brought the receipts.
//! - `Server`: the cluster answered, just not with a 200. Status + body kept verbatim.
//! - `Load`: a page blew up. We tell you which page and how many docs made it before the fall.
//! - `StateTransition`: the load went fine but refresh is still off. Reads are now lying to you.
//! - `LoadAndRestore`: both of the above, the load error is the headline act.
//!
//! Nobody retries anything in here. Every error goes straight back to whoever asked. 🦆

use thiserror::Error;

/// 📦 Crate-wide result alias. Like `anyhow::Result` but with a dress code.
pub type Result<T> = std::result::Result<T, Error>;

/// 💀 Everything that can fail while talking to the search engine.
#[derive(Debug, Error)]
pub enum Error {
    /// 🔧 Bad knobs. Raised before any request leaves the building.
    #[error("💀 configuration rejected: {0}")]
    Configuration(String),

    /// 📦 A document refused to become JSON.
    #[error("💀 failed to serialize a document for the bulk payload")]
    Encoding(#[from] serde_json::Error),

    /// 📡 Network, TLS, timeout. The packet went out and never called home.
    #[error("💀 transport failure while talking to the search engine")]
    Transport(#[from] reqwest::Error),

    /// 🚫 The engine answered with something other than 200. Body kept verbatim for the postmortem.
    #[error("💀 status_code: {status}, body: {body}")]
    Server { status: u16, body: String },

    /// 🏭 The thing producing documents gave up.
    #[error("💀 document source failed: {0}")]
    DocumentSource(String),

    /// 📉 Page `page` (1-based) failed; `documents_committed` made it in before that.
    #[error("💀 bulk load aborted on page {page} after {documents_committed} documents were committed")]
    Load {
        page: usize,
        documents_committed: u64,
        #[source]
        source: Box<Error>,
    },

    /// ⚠️ Refresh could not be re-enabled after the load. The index may still have refresh off.
    #[error("💀 could not re-enable refresh on index '{index}'; the index may be left with refresh disabled")]
    StateTransition {
        index: String,
        #[source]
        source: Box<Error>,
    },

    /// 💀💀 The load failed AND refresh could not be re-enabled. The load error is the primary cause.
    #[error("💀 {load}; additionally, refresh could not be re-enabled on index '{index}': {restore}")]
    LoadAndRestore {
        index: String,
        #[source]
        load: Box<Error>,
        restore: Box<Error>,
    },
}

impl Error {
    /// 🔧 Shorthand for a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 📊 How many documents were committed before the failure, if this error came out of a load.
    pub fn documents_committed(&self) -> Option<u64> {
        match self {
            Error::Load {
                documents_committed,
                ..
            } => Some(*documents_committed),
            Error::LoadAndRestore { load, .. } => load.documents_committed(),
            _ => None,
        }
    }

    /// 🚫 The HTTP status of the innermost server rejection, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Server { status, .. } => Some(*status),
            Error::Load { source, .. } | Error::StateTransition { source, .. } => source.status(),
            Error::LoadAndRestore { load, .. } => load.status(),
            _ => None,
        }
    }

    /// 📜 The raw body of the innermost server rejection, if there was one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Server { body, .. } => Some(body.as_str()),
            Error::Load { source, .. } | Error::StateTransition { source, .. } => source.body(),
            Error::LoadAndRestore { load, .. } => load.body(),
            _ => None,
        }
    }
}
