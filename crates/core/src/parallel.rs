use std::ops::Range;
use std::sync::{Mutex, PoisonError};

/// Upper bound of points one worker is expected to compute.
pub const MAX_POINTS_PER_THREAD: usize = 80_000;
/// Number of indices a worker claims per lock.
pub const CHUNK_SIZE: usize = 80_000;

#[cfg(not(target_arch = "wasm32"))]
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
}

#[cfg(target_arch = "wasm32")]
pub fn available_parallelism() -> usize {
    1
}

/// Number of workers for `item_count` items: one per started
/// `max_per_thread` block, at most `available`, minus `reserve`, never below one.
pub fn worker_count(
    item_count: usize,
    max_per_thread: usize,
    reserve: usize,
    available: usize,
) -> usize {
    let wanted = item_count.div_ceil(max_per_thread.max(1));
    let count = wanted.min(available.max(1));
    count.saturating_sub(reserve).max(1)
}

/// Hands out disjoint, consecutive slices of an output buffer.
///
/// The cursor and the unclaimed tail of the buffer sit behind one mutex, so
/// the index range a worker claims is always the slice it receives.
pub struct WorkQueue<'a, T> {
    state: Mutex<QueueState<'a, T>>,
    total: usize,
    chunk_size: usize,
}

struct QueueState<'a, T> {
    next_index: usize,
    remaining: &'a mut [T],
}

pub struct ClaimedRange<'a, T> {
    pub start: usize,
    pub items: &'a mut [T],
}

impl<T> ClaimedRange<'_, T> {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.items.len()
    }
}

impl<'a, T> WorkQueue<'a, T> {
    pub fn new(buffer: &'a mut [T], chunk_size: usize) -> Self {
        Self {
            total: buffer.len(),
            chunk_size: chunk_size.max(1),
            state: Mutex::new(QueueState {
                next_index: 0,
                remaining: buffer,
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn claim_next_range(&self) -> Option<ClaimedRange<'a, T>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let start = state.next_index;
        if start >= self.total {
            return None;
        }
        let end = self.total.min(start + self.chunk_size);
        let remaining = std::mem::take(&mut state.remaining);
        let (items, rest) = remaining.split_at_mut(end - start);
        state.remaining = rest;
        state.next_index = end;
        Some(ClaimedRange { start, items })
    }
}

/// Writes `f(index, worker_index)` into every slot of `buffer`.
///
/// With one worker (or on wasm) everything runs on the calling thread.
/// Otherwise `workers` tasks drain a shared [`WorkQueue`] and the call
/// returns after all of them finished.
pub fn fill_indexed<T, F>(buffer: &mut [T], workers: usize, chunk_size: usize, f: F)
where
    T: Send,
    F: Fn(usize, usize) -> T + Sync,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if workers > 1 {
            let queue = WorkQueue::new(buffer, chunk_size);
            let queue = &queue;
            let f = &f;
            rayon::scope(|scope| {
                for worker in 0..workers {
                    scope.spawn(move |_| drain_queue(queue, worker, f));
                }
            });
            return;
        }
    }
    #[cfg(target_arch = "wasm32")]
    let _ = workers;

    let queue = WorkQueue::new(buffer, chunk_size);
    drain_queue(&queue, 0, &f);
}

fn drain_queue<T, F>(queue: &WorkQueue<'_, T>, worker: usize, f: &F)
where
    F: Fn(usize, usize) -> T,
{
    while let Some(claimed) = queue.claim_next_range() {
        let start = claimed.start;
        for (offset, slot) in claimed.items.iter_mut().enumerate() {
            *slot = f(start + offset, worker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_stays_within_bounds() {
        for available in 1..=16 {
            for reserve in 0..=3 {
                for items in [0usize, 1, 79_999, 80_000, 80_001, 1_000_000, 10_000_000] {
                    let count = worker_count(items, MAX_POINTS_PER_THREAD, reserve, available);
                    assert!(count >= 1);
                    assert!(count <= available);
                }
            }
        }
    }

    #[test]
    fn worker_count_matches_blocks_and_reserve() {
        assert_eq!(worker_count(1_000_000, 80_000, 0, 64), 13);
        assert_eq!(worker_count(1_000_000, 80_000, 1, 64), 12);
        assert_eq!(worker_count(1_000_000, 80_000, 1, 4), 3);
        assert_eq!(worker_count(100, 80_000, 1, 8), 1);
        assert_eq!(worker_count(0, 80_000, 0, 8), 1);
        assert_eq!(worker_count(10, 0, 0, 4), 4);
        assert_eq!(worker_count(10, 1, 0, 0), 1);
    }

    #[test]
    fn claimed_ranges_cover_everything_once() {
        for total in [0usize, 1, 2, 7, 64, 1000] {
            for chunk in [1usize, 3, 64, 5000] {
                let mut buffer = vec![0u32; total];
                let queue = WorkQueue::new(&mut buffer, chunk);
                let mut expected_start = 0;
                while let Some(claimed) = queue.claim_next_range() {
                    let range = claimed.range();
                    assert_eq!(range.start, expected_start);
                    assert!(!range.is_empty());
                    assert!(range.len() <= chunk);
                    for slot in claimed.items.iter_mut() {
                        *slot += 1;
                    }
                    expected_start = range.end;
                }
                assert_eq!(expected_start, total);
                assert!(queue.claim_next_range().is_none());
                drop(queue);
                assert!(buffer.iter().all(|count| *count == 1));
            }
        }
    }

    #[test]
    fn concurrent_claims_never_overlap() {
        let mut buffer = vec![0u8; 10_007];
        let queue = WorkQueue::new(&mut buffer, 13);
        let claimed = Mutex::new(Vec::new());
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while let Some(range) = queue.claim_next_range() {
                        for slot in range.items.iter_mut() {
                            *slot += 1;
                        }
                        claimed.lock().unwrap().push(range.range());
                    }
                });
            }
        });
        let mut ranges = claimed.into_inner().unwrap();
        ranges.sort_by_key(|range| range.start);
        let mut next = 0;
        for range in ranges {
            assert_eq!(range.start, next);
            next = range.end;
        }
        assert_eq!(next, 10_007);
        drop(queue);
        assert!(buffer.iter().all(|count| *count == 1));
    }

    #[test]
    fn parallel_fill_matches_serial_fill() {
        let f = |index: usize, _worker: usize| (index as f32 * 0.37).sin();
        let mut serial = vec![0.0f32; 50_000];
        fill_indexed(&mut serial, 1, CHUNK_SIZE, f);
        for workers in [2usize, 3, 8] {
            let mut parallel = vec![0.0f32; 50_000];
            fill_indexed(&mut parallel, workers, 997, f);
            assert_eq!(serial, parallel);
        }
    }

    #[test]
    fn serial_fill_uses_worker_zero() {
        let mut buffer = vec![usize::MAX; 100];
        fill_indexed(&mut buffer, 1, 7, |_index, worker| worker);
        assert!(buffer.iter().all(|worker| *worker == 0));
    }

    #[test]
    fn worker_indices_stay_below_worker_count() {
        let mut buffer = vec![usize::MAX; 4096];
        fill_indexed(&mut buffer, 4, 16, |_index, worker| worker);
        assert!(buffer.iter().all(|worker| *worker < 4));
    }
}
