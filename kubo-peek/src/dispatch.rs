// ABOUTME: Deduplicating dispatch stage between the log watcher and the probes
// ABOUTME: A single task owns the set of seen identifiers and hands each new one off exactly once

use crate::probe::Prober;
use kubo_sdk::ContentId;
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Identifiers seen so far. Entries are never removed.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<ContentId>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`, returning true only the first time it is seen
    pub fn admit(&mut self, id: &ContentId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.clone())
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Consume `queue`, passing each first-seen identifier to `handoff` in arrival order.
///
/// Runs until every sender is dropped and returns the final seen set.
pub async fn dispatch<F>(mut queue: mpsc::Receiver<ContentId>, mut handoff: F) -> Deduplicator
where
    F: FnMut(ContentId),
{
    let mut dedup = Deduplicator::new();

    while let Some(id) = queue.recv().await {
        if dedup.admit(&id) {
            log::trace!("Dispatching {}", id);
            handoff(id);
        }
    }

    log::debug!(
        "Dispatch queue closed after {} unique identifiers",
        dedup.len()
    );
    dedup
}

/// Handoff that runs each identifier's probe as its own task
pub fn spawn_probes(prober: Prober) -> impl FnMut(ContentId) {
    move |id| {
        let prober = prober.clone();
        tokio::spawn(async move {
            prober.run(id).await;
        });
    }
}
