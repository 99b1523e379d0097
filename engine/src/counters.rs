use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for the feed. Clones share the same cells.
#[derive(Clone, Default, Debug)]
pub struct FeedCounters {
    pub ticks_routed: Arc<AtomicU64>,
    pub ticks_unrouted: Arc<AtomicU64>,

    // normalizer drops
    pub rejected_stale: Arc<AtomicU64>,
    pub rejected_warmup: Arc<AtomicU64>,

    pub trades_published: Arc<AtomicU64>,
    pub messages_undecoded: Arc<AtomicU64>,
    pub disconnects: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub ticks_routed: u64,
    pub ticks_unrouted: u64,
    pub rejected_stale: u64,
    pub rejected_warmup: u64,
    pub trades_published: u64,
    pub messages_undecoded: u64,
    pub disconnects: u64,
}

impl FeedCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CountersSnapshot {
            ticks_routed: load(&self.ticks_routed),
            ticks_unrouted: load(&self.ticks_unrouted),
            rejected_stale: load(&self.rejected_stale),
            rejected_warmup: load(&self.rejected_warmup),
            trades_published: load(&self.trades_published),
            messages_undecoded: load(&self.messages_undecoded),
            disconnects: load(&self.disconnects),
        }
    }
}
