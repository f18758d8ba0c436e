// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::cmp::Ordering;

use collection_store::{StoreResult, StoreSession};
use core_types::types::{ItemKey, OrderedItem, Predicate, QueryRequest, SortDirection, ViewHandle};
use log::debug;

/// Result of one binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekOutcome {
    pub item: Option<OrderedItem>,
    /// Single-item windows issued while searching, excluding the initial count probe.
    pub probes: usize,
    pub total_count: usize,
}

impl SeekOutcome {
    pub fn found(&self) -> bool {
        self.item.is_some()
    }

    /// Every windowed query issued, count probe included.
    pub fn queries(&self) -> usize {
        self.probes + 1
    }
}

/// Binary search over a view sorted ascending by key.
///
/// Bounds move by the key read at each probe, which coincides with the index when keys are the
/// dense range `0..total_count`. Each update is also clamped past the probed index, so the
/// interval shrinks on every probe whatever the key layout; with gaps a present key may then be
/// reported missing, but the search always terminates.
pub struct OrderedKeySeeker<'s, 'a> {
    session: &'s StoreSession<'a>,
}

impl<'s, 'a> OrderedKeySeeker<'s, 'a> {
    pub fn new(session: &'s StoreSession<'a>) -> Self {
        Self { session }
    }

    fn probe_request(offset: usize) -> QueryRequest {
        QueryRequest::window(offset, 1)
            .with_predicate(Predicate::KeyExists)
            .sorted(SortDirection::Ascending)
    }

    pub async fn seek(&self, view: &ViewHandle, target: ItemKey) -> StoreResult<SeekOutcome> {
        let total_count = self
            .session
            .query(view, Self::probe_request(0))
            .await?
            .total_count;

        let mut low: i64 = 0;
        let mut high: i64 = total_count as i64 - 1;
        let mut probes = 0;
        while low <= high {
            let mid = low + (high - low) / 2;
            probes += 1;
            let page = self
                .session
                .query(view, Self::probe_request(mid as usize))
                .await?;
            let Some(item) = page.items.into_iter().next() else {
                debug!("seek {target}: empty window at offset {mid}");
                break;
            };
            match item.key.cmp(&target) {
                Ordering::Equal => {
                    return Ok(SeekOutcome {
                        item: Some(item),
                        probes,
                        total_count,
                    });
                }
                Ordering::Greater => high = item.key.saturating_sub(1).min(mid - 1),
                Ordering::Less => low = item.key.saturating_add(1).max(mid + 1),
            }
        }

        debug!("seek {target}: not found after {probes} probes");
        Ok(SeekOutcome {
            item: None,
            probes,
            total_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_store::MemoryStore;
    use core_types::retry::RetryPolicy;

    async fn session(store: &MemoryStore) -> StoreSession<'_> {
        StoreSession::open(store, &store.identity(), RetryPolicy::none())
            .await
            .unwrap()
    }

    fn ceil_log2(n: usize) -> usize {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }

    #[tokio::test]
    async fn finds_every_key_within_log_bound() {
        let n = 1_000;
        let store = MemoryStore::with_population("bench", n);
        let session = session(&store).await;
        let root = session.root_view().await.unwrap();
        let seeker = OrderedKeySeeker::new(&session);

        for target in 0..n as ItemKey {
            store.reset_query_count();
            let outcome = seeker.seek(&root, target).await.unwrap();
            assert_eq!(outcome.item.as_ref().map(|i| i.key), Some(target));
            assert!(outcome.queries() <= ceil_log2(n) + 1, "target {target}");
            assert_eq!(store.query_count(), outcome.queries());
        }
    }

    #[tokio::test]
    async fn key_4321_converges_within_14_probes() {
        let store = MemoryStore::with_population("bench", 10_000);
        let session = session(&store).await;
        let root = session.root_view().await.unwrap();

        let outcome = OrderedKeySeeker::new(&session).seek(&root, 4321).await.unwrap();
        assert_eq!(outcome.item.map(|i| i.key), Some(4321));
        assert!(outcome.probes <= 14);
        assert_eq!(outcome.total_count, 10_000);
    }

    #[tokio::test]
    async fn out_of_range_keys_terminate_as_not_found() {
        let store = MemoryStore::with_population("bench", 10_000);
        let session = session(&store).await;
        let root = session.root_view().await.unwrap();
        let seeker = OrderedKeySeeker::new(&session);

        for target in [-1, 10_000, ItemKey::MIN, ItemKey::MAX] {
            let outcome = seeker.seek(&root, target).await.unwrap();
            assert!(!outcome.found(), "target {target}");
            assert!(outcome.probes <= 14, "target {target}: {} probes", outcome.probes);
        }
    }

    #[tokio::test]
    async fn empty_collection_issues_only_the_count_probe() {
        let store = MemoryStore::new("bench");
        let session = session(&store).await;
        let root = session.root_view().await.unwrap();

        let outcome = OrderedKeySeeker::new(&session).seek(&root, 0).await.unwrap();
        assert!(!outcome.found());
        assert_eq!(outcome.probes, 0);
        assert_eq!(store.query_count(), 1);
    }

    #[tokio::test]
    async fn sparse_keys_never_loop() {
        let keys: Vec<ItemKey> = (0..500).map(|k| k * 7 + 3).collect();
        let store = MemoryStore::with_keys("bench", keys.iter().rev().copied());
        let session = session(&store).await;
        let root = session.root_view().await.unwrap();
        let seeker = OrderedKeySeeker::new(&session);

        for target in -5..3_600 {
            let outcome = seeker.seek(&root, target).await.unwrap();
            assert!(outcome.probes <= keys.len());
            if let Some(item) = outcome.item {
                assert_eq!(item.key, target);
            }
        }
    }

    #[tokio::test]
    async fn duplicate_keys_return_a_match() {
        let store = MemoryStore::with_keys("bench", [0, 1, 2, 2, 2, 5, 6]);
        let session = session(&store).await;
        let root = session.root_view().await.unwrap();

        let outcome = OrderedKeySeeker::new(&session).seek(&root, 2).await.unwrap();
        assert_eq!(outcome.item.map(|i| i.key), Some(2));
    }
}
