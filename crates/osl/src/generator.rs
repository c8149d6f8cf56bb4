//! 🏭 Document sources: where the bulk loader gets its documents, one page at a time.
//!
//! 🧠 Knowledge graph:
//! - [`DocumentSource`]: "give me `count` documents". The loader asks once per page.
//! - [`FakeDocumentSource`]: invents plausible-looking people. Seedable, so tests are boring
//!   (boring tests are the best tests).
//! - [`IterDocumentSource`]: caller-supplied documents, drained from any iterator.
//!
//! ⚠️ The fake data is not realistic. It is realistic-adjacent. Do not date these people. 🦆

use chrono::DateTime;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::document::{Article, Document, Tag};
use crate::error::{Error, Result};

/// 🚰 Something that hands out documents on demand.
///
/// # Contract
/// - `next_documents(count)` returns exactly `count` documents, or an error.
/// - Called once per page, in page order. Never called with `count == 0`.
pub trait DocumentSource: Send {
    type Item: Serialize + Send;

    fn next_documents(&mut self, count: usize) -> Result<Vec<Self::Item>>;
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Linus", "Barbara", "Ken", "Margaret", "Dennis", "Frances", "Alan", "Radia",
    "Donald", "Hedy", "Edsger", "Katherine", "Tim",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Torvalds", "Liskov", "Thompson", "Hamilton", "Ritchie", "Allen",
    "Turing", "Perlman", "Knuth", "Lamarr", "Dijkstra", "Johnson", "Berners-Lee",
];

const WORDS: &[&str] = &[
    "index", "shard", "replica", "segment", "refresh", "bulk", "query", "mapping", "cluster",
    "node", "document", "field", "token", "analyzer", "merge", "flush", "snapshot", "alias",
    "search", "score", "filter", "sort", "cache", "heap", "thread", "pool", "queue", "duck",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

fn pick(rng: &mut StdRng, from: &[&'static str]) -> &'static str {
    // -- every list above is non-empty, the fallback is for the borrow checker's peace of mind
    from.choose(rng).copied().unwrap_or("duck")
}

/// 🎲 Makes up documents. Ages 5..=50, heights 140..=180, nested arrays up to `max_nested` long.
#[derive(Debug)]
pub struct FakeDocumentSource {
    rng: StdRng,
    max_nested: usize,
}

impl FakeDocumentSource {
    /// 🚀 `seed: Some(n)` gives the same documents every run. `None` asks the OS for chaos.
    pub fn new(seed: Option<u64>, max_nested: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, max_nested }
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let word_count = self.rng.random_range(min_words..=max_words);
        let mut sentence = String::new();
        for position in 0..word_count {
            let word = pick(&mut self.rng, WORDS);
            if position == 0 {
                // -- capitalize the first word, we have standards
                let mut chars = word.chars();
                if let Some(head) = chars.next() {
                    sentence.push(head.to_ascii_uppercase());
                    sentence.push_str(chars.as_str());
                }
            } else {
                sentence.push(' ');
                sentence.push_str(word);
            }
        }
        sentence.push('.');
        sentence
    }

    fn paragraph(&mut self) -> String {
        let sentence_count = self.rng.random_range(3..=6);
        (0..sentence_count)
            .map(|_| self.sentence(4, 12))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn timestamp(&mut self) -> String {
        // -- somewhere between 1970 and 2030. the articles are timeless, the timestamps are not.
        let seconds = self.rng.random_range(0..1_900_000_000i64);
        DateTime::from_timestamp(seconds, 0)
            .map(|moment| moment.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }

    fn tags(&mut self) -> Vec<Tag> {
        let count = self.rng.random_range(0..=self.max_nested);
        (0..count)
            .map(|_| Tag {
                name: pick(&mut self.rng, WORDS).to_string(),
            })
            .collect()
    }

    fn article(&mut self) -> Article {
        let id = uuid::Builder::from_random_bytes(self.rng.random()).into_uuid();
        Article {
            id: id.hyphenated().to_string(),
            title: self.sentence(3, 8),
            body: self.paragraph(),
            created_at: self.timestamp(),
            tags: self.tags(),
        }
    }

    /// 🎯 One freshly invented person.
    pub fn document(&mut self) -> Document {
        let first = pick(&mut self.rng, FIRST_NAMES);
        let last = pick(&mut self.rng, LAST_NAMES);
        let domain = pick(&mut self.rng, DOMAINS);
        let mailbox_number: u16 = self.rng.random_range(1..=9999);
        let password: String = (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let phone_number = format!(
            "{:03}-{:03}-{:04}",
            self.rng.random_range(200..=999),
            self.rng.random_range(0..=999),
            self.rng.random_range(0..=9999)
        );
        let article_count = self.rng.random_range(0..=self.max_nested);

        Document {
            email: format!("{}.{}{}@{}", first, last, mailbox_number, domain).to_lowercase(),
            password,
            name: format!("{} {}", first, last),
            age: self.rng.random_range(5..=50),
            height: self.rng.random_range(140..=180),
            phone_number,
            latitude: self.rng.random_range(-90.0..=90.0),
            longitude: self.rng.random_range(-180.0..=180.0),
            tags: self.tags(),
            article: (0..article_count).map(|_| self.article()).collect(),
        }
    }
}

impl DocumentSource for FakeDocumentSource {
    type Item = Document;

    fn next_documents(&mut self, count: usize) -> Result<Vec<Document>> {
        Ok((0..count).map(|_| self.document()).collect())
    }
}

/// 📦 Caller-supplied documents, pulled from an iterator a page at a time.
///
/// Running dry before the loader is done is an error: the loader was promised `total_count`.
#[derive(Debug)]
pub struct IterDocumentSource<I> {
    documents: I,
}

impl<I> IterDocumentSource<I> {
    pub fn new(documents: I) -> Self {
        Self { documents }
    }
}

impl<I, T> DocumentSource for IterDocumentSource<I>
where
    I: Iterator<Item = T> + Send,
    T: Serialize + Send,
{
    type Item = T;

    fn next_documents(&mut self, count: usize) -> Result<Vec<T>> {
        let page: Vec<T> = self.documents.by_ref().take(count).collect();
        if page.len() < count {
            return Err(Error::DocumentSource(format!(
                "asked for {} documents, the well ran dry after {}",
                count,
                page.len()
            )));
        }
        Ok(page)
    }
}
