use std::time::Duration;

use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};

use crate::{infrastructure::shutdown::ShutdownListener, page::Document, tasks::pipeline::Pipeline};

/// Drives scanning and draining on two independent periods.
///
/// Both loops run on the caller's task, so their work interleaves only at
/// await points. A paused tick is skipped, not cancelled; shutdown is checked
/// before every tick and ends both loops for good. Work already started is
/// allowed to finish.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    pub scan_interval: Duration,
    pub drain_interval: Duration,
    pub batch_size: usize,
}

impl Scheduler {
    pub async fn run<D: Document>(&self, pipeline: &Pipeline<D>, shutdown: ShutdownListener) {
        tracing::info!(
            target: "scheduler",
            scan = ?self.scan_interval,
            drain = ?self.drain_interval,
            batch = self.batch_size,
            "scheduler started"
        );
        tokio::join!(
            self.scan_loop(pipeline, shutdown.clone()),
            self.drain_loop(pipeline, shutdown)
        );
        tracing::info!(target: "scheduler", "scheduler stopped");
    }

    async fn scan_loop<D: Document>(&self, pipeline: &Pipeline<D>, mut shutdown: ShutdownListener) {
        // first tick fires immediately: initial scan at start-up
        let mut ticker = interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        while next_tick(&mut ticker, &mut shutdown).await {
            if pipeline.settings().paused {
                tracing::debug!(target: "scheduler", "paused; scan skipped");
                continue;
            }
            pipeline.scan().await;
        }
    }

    async fn drain_loop<D: Document>(&self, pipeline: &Pipeline<D>, mut shutdown: ShutdownListener) {
        let mut ticker = interval_at(Instant::now() + self.drain_interval, self.drain_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        while next_tick(&mut ticker, &mut shutdown).await {
            if pipeline.settings().paused {
                tracing::debug!(target: "scheduler", "paused; drain skipped");
                continue;
            }
            pipeline.drain(self.batch_size).await;
        }
    }
}

/// Waits for the next tick; false once shutdown has been signalled.
async fn next_tick(ticker: &mut Interval, shutdown: &mut ShutdownListener) -> bool {
    if shutdown.is_triggered() {
        return false;
    }
    let ticked = tokio::select! {
        biased;
        _ = shutdown.notified() => false,
        _ = ticker.tick() => true,
    };
    ticked && !shutdown.is_triggered()
}
