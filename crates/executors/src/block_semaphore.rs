use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tokio::sync::Notify;

/// Caps how many concurrent resolutions may be in flight across every
/// block, releasing freed capacity to the lowest-numbered waiting block
/// first.
///
/// Pricing a composite token (an LP token, a vault share) recurses into
/// pricing its underlying tokens at the same block, and the background
/// catch-up loop ([`crate`]'s filter machinery) fetches older blocks
/// concurrently with the head-chasing path. Without a shared, fairness-
/// aware cap, head-chasing work (high block numbers, usually small,
/// latency-sensitive requests) can starve catch-up work (low block
/// numbers, the thing actually closing the gap) or vice versa — a plain
/// per-block `Semaphore` gives every block its own independent capacity
/// and has no opinion about which block's waiters go first. This ties
/// every caller to one shared pool and orders release by block number,
/// lowest first, so catch-up work is preferred once it starts waiting.
///
/// Grounded on `FilterEngine`'s `Notify`-gated checkpoint
/// (`crates/filter/src/engine.rs`) for the register-then-wait-on-Notify
/// shape, adapted here with a priority queue instead of a plain counter
/// so waiters are woken in block order rather than FIFO.
#[derive(Debug, Clone)]
pub struct BlockSemaphore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    capacity: usize,
    state: Mutex<State>,
    notify: Notify,
}

#[derive(Debug, Default)]
struct State {
    in_use: usize,
    waiters: BinaryHeap<Reverse<(u64, u64)>>,
    next_seq: u64,
}

impl BlockSemaphore {
    /// Allow up to `capacity` concurrent resolutions in total.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner { capacity: capacity.max(1), state: Mutex::new(State::default()), notify: Notify::new() }),
        }
    }

    /// Acquire a permit for work on `block`. If the pool is at capacity,
    /// waits until a permit frees up; among waiters, the lowest `block`
    /// is granted first, ties broken by arrival order.
    pub async fn acquire(&self, block: u64) -> BlockPermit {
        let seq = {
            let mut state = self.inner.state.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.waiters.push(Reverse((block, seq)));
            seq
        };

        loop {
            {
                let mut state = self.inner.state.lock();
                let at_front = state.waiters.peek() == Some(&Reverse((block, seq)));
                if at_front && state.in_use < self.inner.capacity {
                    state.in_use += 1;
                    state.waiters.pop();
                    drop(state);
                    // Wake the next waiter too: capacity may allow more
                    // than one grant per freed permit.
                    self.inner.notify.notify_waiters();
                    return BlockPermit { inner: self.inner.clone() };
                }
            }
            self.inner.notify.notified().await;
        }
    }
}

/// A held slot in a [`BlockSemaphore`]. Releases the slot on drop.
#[derive(Debug)]
pub struct BlockPermit {
    inner: Arc<Inner>,
}

impl Drop for BlockPermit {
    fn drop(&mut self) {
        {
            let mut state = self.inner.state.lock();
            state.in_use -= 1;
        }
        self.inner.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn different_blocks_share_capacity() {
        let sem = BlockSemaphore::new(2);
        let _a = sem.acquire(100).await;
        // A second block can still acquire while capacity remains.
        let fut = sem.acquire(200);
        tokio::time::timeout(std::time::Duration::from_millis(50), fut)
            .await
            .expect("acquiring while capacity remains should not wait");
    }

    #[tokio::test]
    async fn lower_block_wins_priority_on_release() {
        let sem = BlockSemaphore::new(1);
        let held = sem.acquire(500).await;

        // Two callers queue up behind the single permit: a high block
        // (head-chasing) first, then a low block (catch-up).
        let sem_high = sem.clone();
        let high = tokio::spawn(async move {
            let _p = sem_high.acquire(900).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let sem_low = sem.clone();
        let low = tokio::spawn(async move {
            let _p = sem_low.acquire(100).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        drop(held);

        // The lower block number must be granted first despite arriving
        // second, so it finishes (and is droppable) before the higher
        // one even though both were queued before the release.
        low.await.unwrap();
        high.await.unwrap();
    }
}
