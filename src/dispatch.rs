use crate::error::Result;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Returns the default worker pool size for the batch completion path.
///
/// This is an internal default, not a user-facing tunable; the settings file
/// may override it.
#[must_use]
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

/// Fans `items` out across a bounded pool of worker threads and collects
/// results in input order.
///
/// Each item is passed to `worker` exactly once. The returned vector has one
/// entry per input item, at the item's own index, regardless of completion
/// order. Per-item failures stay in their slot; the caller decides whether
/// to abort or surface partial results.
///
/// A `max_workers` of 0 is treated as 1. The pool never exceeds the number
/// of items.
pub fn map_concurrently<T, R, F>(items: &[T], max_workers: usize, worker: F) -> Vec<Result<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let pool_size = max_workers.max(1).min(items.len());
    debug!(items = items.len(), workers = pool_size, "dispatching batch");

    let cursor = AtomicUsize::new(0);
    let slots: Vec<Mutex<Option<Result<R>>>> = items.iter().map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        for _ in 0..pool_size {
            scope.spawn(|| {
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    if index >= items.len() {
                        break;
                    }

                    let result = worker(&items[index]);
                    // Mutex poisoning only happens if a worker panicked, and
                    // a worker panic aborts the whole scope anyway.
                    if let Ok(mut slot) = slots[index].lock() {
                        *slot = Some(result);
                    }
                }
            });
        }
    });

    slots
        .into_iter()
        .map(|slot| {
            slot.into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .expect("every slot is filled before the scope ends")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_empty_input() {
        let results = map_concurrently(&[] as &[u32], 4, |n| Ok(*n));
        assert!(results.is_empty());
    }

    #[test]
    fn test_preserves_input_order_under_jitter() {
        let items: Vec<usize> = (0..32).collect();

        // Later items finish first, so completion order inverts input order.
        let results = map_concurrently(&items, 8, |n| {
            std::thread::sleep(Duration::from_millis((32 - *n as u64) % 7));
            Ok(n * 10)
        });

        let values: Vec<usize> = results.into_iter().map(|r| r.unwrap()).collect();
        let expected: Vec<usize> = (0..32).map(|n| n * 10).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_each_item_processed_once() {
        let items: Vec<usize> = (0..100).collect();
        let calls = AtomicUsize::new(0);

        let results = map_concurrently(&items, 4, |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(*n)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 100);
        assert_eq!(results.len(), 100);
    }

    #[test]
    fn test_failure_stays_in_its_slot() {
        let items = vec!["ok", "boom", "ok"];

        let results = map_concurrently(&items, 2, |s| {
            if *s == "boom" {
                Err(Error::network("simulated"))
            } else {
                Ok(s.to_uppercase())
            }
        });

        assert_eq!(results[0].as_deref().unwrap(), "OK");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_deref().unwrap(), "OK");
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        let items = vec![1, 2, 3];
        let results = map_concurrently(&items, 0, |n| Ok(n + 1));
        let values: Vec<i32> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![2, 3, 4]);
    }

    #[test]
    fn test_single_worker_is_sequential_order() {
        let items: Vec<usize> = (0..10).collect();
        let results = map_concurrently(&items, 1, |n| Ok(*n));
        let values: Vec<usize> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, items);
    }
}
