//! Fact collection across the operational store and the warehouse
//!
//! Every source is queried concurrently under its own timeout. Any failure
//! fails the whole collection, so nothing downstream sees a partial window.

use crate::adapters::MatchFactSource;
use crate::domain::{MatchFact, Window};
use crate::error::{LaurelError, Result};
use crate::ranking::merge_facts;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Facts gathered for one window
#[derive(Debug, Clone, Default)]
pub struct CollectedFacts {
    pub facts: Vec<MatchFact>,
    /// (source name, facts returned) in query order
    pub per_source: Vec<(String, usize)>,
}

pub struct FactCollector {
    /// Highest priority first: on overlap the earlier source's copy is kept
    sources: Vec<Arc<dyn MatchFactSource>>,
    timeout: Duration,
}

impl FactCollector {
    pub fn new(sources: Vec<Arc<dyn MatchFactSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    async fn query(&self, source: &Arc<dyn MatchFactSource>, window: &Window) -> Result<Vec<MatchFact>> {
        let started = Instant::now();
        match tokio::time::timeout(self.timeout, source.list_match_facts(window)).await {
            Ok(Ok(facts)) => {
                debug!(
                    "{} returned {} facts in {}ms",
                    source.name(),
                    facts.len(),
                    started.elapsed().as_millis()
                );
                Ok(facts)
            }
            Ok(Err(e)) => {
                error!("{} query failed: {}", source.name(), e);
                if e.is_source_failure() {
                    Err(e)
                } else {
                    Err(LaurelError::unavailable(source.name(), e))
                }
            }
            Err(_) => {
                error!("{} query timed out after {:?}", source.name(), self.timeout);
                Err(LaurelError::DataSourceTimeout {
                    store: source.name().to_string(),
                    elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Query all sources and merge without double counting
    pub async fn collect(&self, window: &Window) -> Result<CollectedFacts> {
        let results = try_join_all(self.sources.iter().map(|s| self.query(s, window))).await?;

        let per_source: Vec<(String, usize)> = self
            .sources
            .iter()
            .zip(results.iter())
            .map(|(s, facts)| (s.name().to_string(), facts.len()))
            .collect();

        let facts = results
            .into_iter()
            .reduce(merge_facts)
            .unwrap_or_default();

        info!("Collected {} facts for {} from {:?}", facts.len(), window, per_source);
        Ok(CollectedFacts { facts, per_source })
    }
}
