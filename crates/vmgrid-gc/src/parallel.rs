//! Bounded fan-out with one result slot per input.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Run `f` over every item with at most `workers` futures in flight.
///
/// Waits for all of them and returns the results in input order,
/// whatever order they completed in.
pub async fn parallelize<T, R, F, Fut>(workers: usize, items: Vec<T>, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let workers = workers.max(1);
    let mut slots: Vec<Option<R>> = items.iter().map(|_| None).collect();
    let mut pending = items.into_iter().enumerate();
    let mut in_flight = FuturesUnordered::new();

    loop {
        while in_flight.len() < workers {
            let Some((index, item)) = pending.next() else {
                break;
            };
            let work = f(item);
            in_flight.push(async move { (index, work.await) });
        }
        match in_flight.next().await {
            Some((index, result)) => slots[index] = Some(result),
            None => break,
        }
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn results_keep_input_order() {
        let items: Vec<u64> = (0..10).collect();
        let out = parallelize(4, items, |n: u64| async move {
            // Later items finish first.
            tokio::time::sleep(Duration::from_millis(20 - n * 2)).await;
            n * 10
        })
        .await;
        assert_eq!(out, (0..10).map(|n| n * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (in_flight, peak_ref) = (&in_flight, &peak);
        let items: Vec<usize> = (0..50).collect();

        parallelize(5, items, |_| async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak_ref.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        })
        .await;

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 5, "peak {peak}");
        assert!(peak > 1);
    }

    #[tokio::test]
    async fn empty_input() {
        let items: Vec<u8> = Vec::new();
        let out: Vec<u8> = parallelize(20, items, |n| async move { n }).await;
        assert!(out.is_empty());
    }
}
