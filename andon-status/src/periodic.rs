//! Fixed-interval background loop shared by the refreshers and the monitor
//!
//! The first pass runs immediately, later passes on each tick. A pass that
//! panics is logged and the loop carries on with the next tick. Cancellation
//! is observed between passes and ends the loop normally.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Run `pass` every `period` until `cancel` fires
pub async fn run_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut pass: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    info!("{} started ({:?} interval)", name, period);

    let mut timer = interval(period);
    // A slow pass must not cause a burst of catch-up passes
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        if let Err(panic_payload) = AssertUnwindSafe(pass()).catch_unwind().await {
            let panic_msg = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("{} pass panicked: {}", name, panic_msg);
        }
    }

    info!("{} stopped", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::task::JoinHandle;

    const PERIOD: Duration = Duration::from_secs(60);

    /// Let every runnable task finish its current step
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn counting_loop(
        cancel: &CancellationToken,
        panic_on_first: bool,
    ) -> (Arc<AtomicUsize>, JoinHandle<()>) {
        let passes = Arc::new(AtomicUsize::new(0));
        let counter = passes.clone();
        let handle = tokio::spawn(run_periodic("test loop", PERIOD, cancel.clone(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 && panic_on_first {
                    panic!("first pass fails");
                }
            }
        }));
        (passes, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pass_immediate_then_one_per_tick() {
        let cancel = CancellationToken::new();
        let (passes, handle) = counting_loop(&cancel, false);

        settle().await;
        assert_eq!(passes.load(Ordering::SeqCst), 1);

        tokio::time::advance(PERIOD - Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(passes.load(Ordering::SeqCst), 1);

        for expected in 2..=4 {
            tokio::time::advance(PERIOD).await;
            settle().await;
            assert_eq!(passes.load(Ordering::SeqCst), expected);
        }

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ticks_are_skipped() {
        let cancel = CancellationToken::new();
        let (passes, handle) = counting_loop(&cancel, false);
        settle().await;

        tokio::time::advance(PERIOD * 5).await;
        settle().await;
        assert_eq!(passes.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_waiting_promptly() {
        let cancel = CancellationToken::new();
        let (passes, handle) = counting_loop(&cancel, false);
        settle().await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should exit within the timeout")
            .unwrap();
        assert_eq!(passes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_pass_does_not_stop_loop() {
        let cancel = CancellationToken::new();
        let (passes, handle) = counting_loop(&cancel, true);
        settle().await;
        assert_eq!(passes.load(Ordering::SeqCst), 1);

        tokio::time::advance(PERIOD).await;
        settle().await;
        assert_eq!(passes.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}
