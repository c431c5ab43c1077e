//! Category-affinity recommendations.
//!
//! Given the books found in one scan, pick the **dominant category** (the
//! label carried by the most books, first-encountered label winning ties)
//! and produce at most `limit` recommended books in that category.
//!
//! Two strategies are available, selected by `recommend.strategy`:
//!
//! | Strategy | Behavior |
//! |----------|----------|
//! | `local`  | Return the scanned books that carry the dominant category |
//! | `remote` | Ask the [`BookCatalog`] for books filed under that category |
//!
//! Neither strategy ever fails. Empty input, input with no categories, and
//! (for `remote`) any catalog failure all yield an empty list; catalog
//! failures are logged at `warn`.
//!
//! Records without categories contribute nothing to counting and are never
//! recommended by the `local` strategy.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::BookCatalog;
use crate::config::RecommendConfig;
use crate::models::BookRecord;

/// Recommendation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Local,
    Remote,
}

impl Strategy {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "local" => Ok(Strategy::Local),
            "remote" => Ok(Strategy::Remote),
            other => anyhow::bail!("Unknown recommend strategy: {}", other),
        }
    }
}

/// Pick the most frequent category label across `books`.
///
/// Labels are counted once per book even if a book repeats them. Ties go to
/// the label seen first, scanning books in order and each book's labels in
/// order. Returns `None` when no book has any category.
pub fn dominant_category(books: &[BookRecord]) -> Option<String> {
    // Labels in first-seen order, with counts alongside
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for book in books {
        let labels = book.category_labels();
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                continue;
            }
            match index.get(label.as_str()) {
                Some(&slot) => order[slot].1 += 1,
                None => {
                    index.insert(label.as_str(), order.len());
                    order.push((label.as_str(), 1));
                }
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for &(label, count) in &order {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

/// Local-filter strategy: scanned books carrying the dominant category, in
/// input order, at most `limit`.
pub fn recommend_local(books: &[BookRecord], limit: usize) -> Vec<BookRecord> {
    let Some(category) = dominant_category(books) else {
        return Vec::new();
    };

    books
        .iter()
        .filter(|b| b.has_category(&category))
        .take(limit)
        .cloned()
        .collect()
}

/// Remote-lookup strategy: up to `limit` catalog books filed under the
/// dominant category.
///
/// Performs at most one catalog call. Any catalog error is logged and
/// turned into an empty list.
pub async fn recommend_remote(
    books: &[BookRecord],
    catalog: &dyn BookCatalog,
    limit: usize,
) -> Vec<BookRecord> {
    let Some(category) = dominant_category(books) else {
        return Vec::new();
    };

    match catalog.search_subject(&category, limit).await {
        Ok(mut found) => {
            found.truncate(limit);
            tracing::debug!(category = %category, count = found.len(), "remote recommendations");
            found
        }
        Err(e) => {
            tracing::warn!(category = %category, error = %e, "recommendation lookup failed");
            Vec::new()
        }
    }
}

/// Strategy plus limit, resolved from configuration once at startup.
#[derive(Clone)]
pub struct Recommender {
    strategy: Strategy,
    limit: usize,
    catalog: Arc<dyn BookCatalog>,
}

impl Recommender {
    pub fn new(strategy: Strategy, limit: usize, catalog: Arc<dyn BookCatalog>) -> Self {
        Self {
            strategy,
            limit,
            catalog,
        }
    }

    pub fn from_config(config: &RecommendConfig, catalog: Arc<dyn BookCatalog>) -> anyhow::Result<Self> {
        Ok(Self::new(
            Strategy::parse(&config.strategy)?,
            config.limit,
            catalog,
        ))
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub async fn recommend(&self, books: &[BookRecord]) -> Vec<BookRecord> {
        match self.strategy {
            Strategy::Local => recommend_local(books, self.limit),
            Strategy::Remote => recommend_remote(books, self.catalog.as_ref(), self.limit).await,
        }
    }
}
