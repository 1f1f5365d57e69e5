//! Projects posts into the flat records consumed by an external search
//! service. Submitting them (batching, credentials) is left to that service's
//! tooling; we only write the records as a JSON array.

use crate::index::PostIndex;
use serde::Serialize;
use std::io::Write;

/// One searchable post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchRecord<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub slug: &'a str,
    pub category: &'a str,
}

/// Returns one [`SearchRecord`] per post, in index order.
pub fn records(index: &PostIndex) -> Vec<SearchRecord<'_>> {
    index
        .posts()
        .iter()
        .map(|post| SearchRecord {
            title: &post.title,
            description: &post.description,
            slug: post.slug.as_str(),
            category: &post.category,
        })
        .collect()
}

/// Writes `records` to `w` as a JSON array.
pub fn write_records<W: Write>(w: W, records: &[SearchRecord]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(w, records)
}
