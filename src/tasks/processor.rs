use std::sync::atomic::Ordering;

use crate::{
    ai::BatchItem,
    domain::{ClassificationResult, CommentCandidate},
    page::Document,
    tasks::pipeline::Pipeline,
};

pub const DRY_RUN_SCORE: i64 = 5;
pub const DRY_RUN_NOTE: &str = "[dry run] simulated result";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    Paused,
    EmptyQueue,
    NoCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Idle(IdleReason),
    Classified { items: usize, dry_run: bool },
    Failed { items: usize, requeued: usize },
}

impl<D: Document> Pipeline<D> {
    /// Takes up to `max_batch` of the oldest queued comments and resolves
    /// them in one classification call (or synthetically in dry-run mode).
    ///
    /// Failures are logged and the batch is abandoned; nothing is returned
    /// as an error. Unless requeueing is enabled an abandoned item is only
    /// seen again if the host renders it as a new node.
    pub async fn drain(&self, max_batch: usize) -> DrainOutcome {
        self.drains.fetch_add(1, Ordering::Relaxed);
        let settings = self.settings.current();

        if settings.paused {
            tracing::debug!(target: "processor", "paused; skipping drain");
            return DrainOutcome::Idle(IdleReason::Paused);
        }
        if self.queue.is_empty() {
            tracing::debug!(target: "processor", "queue empty; skipping drain");
            return DrainOutcome::Idle(IdleReason::EmptyQueue);
        }
        let Some(credential) = settings.credential else {
            tracing::warn!(
                target: "processor",
                pending = self.queue.len(),
                "no classification credential configured; skipping drain"
            );
            return DrainOutcome::Idle(IdleReason::NoCredential);
        };

        let batch = self.queue.take_front(max_batch);
        if batch.is_empty() {
            return DrainOutcome::Idle(IdleReason::EmptyQueue);
        }
        let identities: Vec<&str> = batch.iter().map(|c| c.identity.as_str()).collect();
        tracing::info!(
            target: "processor",
            total = batch.len(),
            remaining = self.queue.len(),
            dry_run = settings.dry_run,
            ?identities,
            "processing batch"
        );

        if settings.dry_run {
            let results = vec![ClassificationResult::new(DRY_RUN_SCORE, DRY_RUN_NOTE); batch.len()];
            let items = batch.len();
            self.apply_results(batch, results).await;
            return DrainOutcome::Classified {
                items,
                dry_run: true,
            };
        }

        let items: Vec<BatchItem<'_>> = batch
            .iter()
            .map(|c| BatchItem {
                identity: &c.identity,
                content: &c.content,
            })
            .collect();
        let verdicts = self.classifier.classify(&credential, &items).await;
        drop(items);

        match verdicts {
            Ok(verdicts) => {
                let items = batch.len();
                if verdicts.len() < items {
                    tracing::warn!(
                        target: "processor",
                        expected = items,
                        received = verdicts.len(),
                        "classification array shorter than batch; padding with minimal scores"
                    );
                } else if verdicts.len() > items {
                    tracing::debug!(
                        target: "processor",
                        expected = items,
                        received = verdicts.len(),
                        "ignoring surplus verdicts"
                    );
                }
                self.apply_results(batch, verdicts).await;
                DrainOutcome::Classified {
                    items,
                    dry_run: false,
                }
            }
            Err(err) => {
                let items = batch.len();
                let requeued = if self.requeue_failed {
                    self.queue.restore_front(batch)
                } else {
                    0
                };
                tracing::error!(
                    target: "processor",
                    error = %err,
                    items,
                    requeued,
                    "classification failed; batch abandoned"
                );
                DrainOutcome::Failed { items, requeued }
            }
        }
    }

    async fn apply_results(
        &self,
        batch: Vec<CommentCandidate<D::Node>>,
        results: Vec<ClassificationResult>,
    ) {
        let mut results = results.into_iter();
        for item in batch {
            let result = results.next().unwrap_or_else(ClassificationResult::fallback);
            tracing::info!(
                target: "processor",
                identity = %item.identity,
                fingerprint = %item.fingerprint,
                score = result.score,
                "caching result"
            );
            self.cache.put(&item.fingerprint, &result).await;
            self.annotate(&item.node, &result);
        }
    }
}
