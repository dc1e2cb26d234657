use std::collections::HashMap;

use owo_colors::OwoColorize;

use crate::openalex::{Client, Work};

/// Resolves journal impact scores, memoized per journal id.
///
/// The cache lives for one run: it is shared across all queries of that run
/// and dies with the process. Unbounded and never invalidated, which is fine
/// for a short-lived batch job.
pub struct Scorer<'a> {
    client: &'a Client,
    cache: HashMap<String, f64>,
}

impl<'a> Scorer<'a> {
    pub fn new(client: &'a Client) -> Self {
        Scorer {
            client,
            cache: HashMap::new(),
        }
    }

    /// 2-year mean citedness of the work's hosting journal.
    ///
    /// A work without a resolvable journal id scores 0.0 with no network
    /// call. A failed lookup is logged and also scores 0.0, without being
    /// cached. That makes a transient API failure indistinguishable from
    /// "no impact data": both exclude the work whenever a positive threshold
    /// is configured. Known correctness risk, kept for compatibility.
    pub fn score(&mut self, work: &Work) -> f64 {
        let Some(journal_id) = work.journal_id() else {
            return 0.0;
        };
        if let Some(&cached) = self.cache.get(journal_id) {
            return cached;
        }
        match self.client.source_impact(journal_id) {
            Ok(impact) => {
                self.cache.insert(journal_id.to_string(), impact);
                impact
            }
            Err(e) => {
                eprintln!(
                    "{} error fetching journal impact for {journal_id}: {e:#}",
                    "⚠".yellow()
                );
                0.0
            }
        }
    }
}
