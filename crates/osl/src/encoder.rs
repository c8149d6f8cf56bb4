//! 🎬 *[a dark and stormy deploy. the bulk endpoint demands newlines. the encoder obliges.]*
//! *[every line, alone. no brackets. no comfort. just `\n`. this is NDJSON.]*
//!
//! 📡 **BulkEncoder** turns a page of documents into a `/_bulk` payload.
//!
//! The bulk API has rules:
//! - Rule 1: Two lines per document. Action header, then document. Always.
//! - Rule 2: Newline-delimited. Not comma-separated. Not XML. NEWLINES.
//! - Rule 3: The payload ends with exactly one `\n`. Missing it, or doubling it,
//!   gets the whole request bounced. Three engineers lost weekends to this.
//!
//! ```text
//! {"create":{"_index":"go-test-1"}}
//! {"Email":"...","Age":23,...}
//! {"create":{"_index":"go-test-1"}}
//! {"Email":"...","Age":41,...}
//! ```
//!
//! 🦆 The duck asked what NDJSON stands for. We told it. It left anyway.

use serde::Serialize;
use serde_json::json;

use crate::error::Result;

/// 📡 Renders pages of documents as `create` bulk actions against one index.
///
/// The header line is rendered once, at construction, so a 500-document page costs
/// 500 document serializations and zero header serializations. The header goes through
/// serde_json so odd index names still come out as valid JSON.
#[derive(Debug, Clone)]
pub struct BulkEncoder {
    index: String,
    header: String,
}

impl BulkEncoder {
    pub fn new(index: impl Into<String>) -> Self {
        let index = index.into();
        // -- {"create":{"_index":"<name>"}}, the sacred action envelope. create, never index:
        // -- documents are appended, not overwritten.
        let header = json!({ "create": { "_index": index } }).to_string();
        Self { index, header }
    }

    /// 📦 The index every action points at.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// 🏷️ The action header line, without its newline.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// 🔄 Encode a page. Empty page, empty payload (the loader never sends one of those).
    ///
    /// Pure: no I/O, no validation of document content. The only failure is serde refusing
    /// to serialize a document, which surfaces as [`crate::Error::Encoding`].
    pub fn encode<T: Serialize>(&self, documents: &[T]) -> Result<String> {
        // -- 🧮 vibes-based pre-allocation: header + ~256 bytes of document per line pair
        let mut payload = String::with_capacity(documents.len() * (self.header.len() + 258));
        for document in documents {
            payload.push_str(&self.header);
            payload.push('\n');
            payload.push_str(&serde_json::to_string(document)?);
            payload.push('\n');
        }
        // -- ✅ the last document line already carries the one and only trailing \n.
        // -- Ancient proverb: "He who appends another, debugs at 3am."
        Ok(payload)
    }
}
