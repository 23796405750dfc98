use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::{
    ai::Classifier,
    db::ScoreCache,
    domain::{ClassificationResult, CommentCandidate, QueueSnapshot, Settings},
    infrastructure::settings::SettingsSource,
    page::Document,
    tasks::{annotator, extractor::Extractor, queue::PendingQueue},
};

/// Outcome of offering one candidate to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Cached(ClassificationResult),
    Queued,
    AlreadyQueued,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub found: usize,
    pub cache_hits: usize,
    pub queued: usize,
    pub in_flight: usize,
}

/// Owns every piece of state the scan and drain ticks share.
///
/// The document and the queue sit behind short synchronous locks that are
/// never held across an await; the cache and the classifier are the only
/// suspending calls.
pub struct Pipeline<D: Document> {
    pub(super) document: Mutex<D>,
    pub(super) extractor: Extractor,
    pub(super) queue: PendingQueue<D::Node>,
    pub(super) cache: Arc<dyn ScoreCache>,
    pub(super) classifier: Arc<dyn Classifier>,
    pub(super) settings: Arc<dyn SettingsSource>,
    pub(super) requeue_failed: bool,
    scans: AtomicU64,
    pub(super) drains: AtomicU64,
}

impl<D: Document> Pipeline<D> {
    pub fn new(
        document: D,
        extractor: Extractor,
        cache: Arc<dyn ScoreCache>,
        classifier: Arc<dyn Classifier>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            document: Mutex::new(document),
            extractor,
            queue: PendingQueue::new(),
            cache,
            classifier,
            settings,
            requeue_failed: false,
            scans: AtomicU64::new(0),
            drains: AtomicU64::new(0),
        }
    }

    /// Push the items of a failed live batch back to the front of the queue
    /// instead of dropping them.
    pub fn with_requeue_failed(mut self, enabled: bool) -> Self {
        self.requeue_failed = enabled;
        self
    }

    pub fn settings(&self) -> Settings {
        self.settings.current()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn drain_count(&self) -> u64 {
        self.drains.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &Arc<dyn ScoreCache> {
        &self.cache
    }

    /// Runs `f` against the document under its lock.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.document.lock())
    }

    /// One extraction pass: pull new comments, annotate cache hits straight
    /// away and queue the rest.
    pub async fn scan(&self) -> ScanSummary {
        let scan_no = self.scans.fetch_add(1, Ordering::Relaxed) + 1;
        let (candidates, report) = {
            let mut doc = self.document.lock();
            doc.refresh();
            self.extractor.extract(&mut *doc)
        };

        let mut summary = ScanSummary {
            found: candidates.len(),
            ..Default::default()
        };
        for candidate in candidates {
            let node = candidate.node.clone();
            match self.admit(candidate).await {
                Admission::Cached(result) => {
                    summary.cache_hits += 1;
                    self.annotate(&node, &result);
                }
                Admission::Queued => summary.queued += 1,
                Admission::AlreadyQueued => summary.in_flight += 1,
            }
        }

        tracing::info!(
            target: "scanner",
            scan = scan_no,
            strategy = self.extractor.strategy_version(),
            matched = report.matched,
            new = report.accepted,
            already_seen = report.already_seen,
            overlapping = report.overlapping,
            duplicates = report.duplicates,
            invalid = report.invalid,
            cache_hits = summary.cache_hits,
            queued = summary.queued,
            in_flight = summary.in_flight,
            queue_size = self.queue.len(),
            "scan complete"
        );
        summary
    }

    /// Cache hit returns the stored result; a miss is queued once per
    /// fingerprint.
    pub async fn admit(&self, candidate: CommentCandidate<D::Node>) -> Admission {
        if let Some(result) = self.cache.get(&candidate.fingerprint).await {
            tracing::debug!(target: "queue", identity = %candidate.identity, score = result.score, "using cached result");
            return Admission::Cached(result);
        }
        let identity = candidate.identity.clone();
        if self.queue.push(candidate) {
            tracing::debug!(target: "queue", identity = %identity, "queued for classification");
            Admission::Queued
        } else {
            Admission::AlreadyQueued
        }
    }

    pub(super) fn annotate(&self, node: &D::Node, result: &ClassificationResult) {
        let annotation = annotator::render(result);
        tracing::debug!(
            target: "annotator",
            ?node,
            tier = ?annotation.tier,
            label = %annotation.label,
            "annotating comment"
        );
        self.document.lock().annotate(node, &annotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, FakeDocument};

    #[tokio::test]
    async fn admitting_twice_queues_once() {
        let fx = fixture(FakeDocument::new());
        let first = CommentCandidate::new("ana", "same comment", 1usize);
        let second = CommentCandidate::new("ana", "same comment", 2usize);

        assert_eq!(fx.pipeline.admit(first).await, Admission::Queued);
        assert_eq!(fx.pipeline.admit(second).await, Admission::AlreadyQueued);
        assert_eq!(fx.pipeline.snapshot().pending, 1);
    }

    #[tokio::test]
    async fn cache_hit_never_enqueues() {
        let fx = fixture(FakeDocument::new());
        let candidate = CommentCandidate::new("ana", "seen before", 1usize);
        let cached = ClassificationResult::new(8, "known");
        fx.cache.insert(&candidate.fingerprint, cached.clone());

        assert_eq!(fx.pipeline.admit(candidate).await, Admission::Cached(cached));
        assert_eq!(fx.pipeline.snapshot().pending, 0);
    }

    #[tokio::test]
    async fn scan_annotates_hits_and_queues_misses() {
        let mut doc = FakeDocument::new();
        let known = doc.comment(None, "ana", "already scored");
        doc.comment(None, "bo", "brand new");
        let fx = fixture(doc);
        fx.cache.insert(
            &crate::domain::fingerprint::fingerprint("ana", "already scored"),
            ClassificationResult::new(9, ""),
        );

        let summary = fx.pipeline.scan().await;
        assert_eq!(summary.found, 2);
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(summary.queued, 1);

        let annotated = fx.pipeline.with_document(|doc| doc.annotated_nodes());
        assert_eq!(annotated, vec![known]);
        assert_eq!(fx.pipeline.scan_count(), 1);
    }

    #[tokio::test]
    async fn rescan_of_unchanged_document_adds_nothing() {
        let mut doc = FakeDocument::new();
        doc.comment(None, "ana", "hello there");
        let fx = fixture(doc);

        fx.pipeline.scan().await;
        let second = fx.pipeline.scan().await;
        assert_eq!(second, ScanSummary::default());
        assert_eq!(fx.pipeline.snapshot().pending, 1);
    }

    #[tokio::test]
    async fn rerendered_comment_reuses_cached_score() {
        let mut doc = FakeDocument::new();
        doc.comment(None, "ana", "hello there");
        let fx = fixture(doc);
        fx.pipeline.scan().await;
        fx.pipeline.drain(4).await;
        assert_eq!(fx.classifier.calls(), 1);

        // host drops the node and renders the same comment again
        let fresh = fx.pipeline.with_document(|doc| {
            doc.remove(0);
            doc.comment(None, "ana", "hello there")
        });
        let summary = fx.pipeline.scan().await;
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(fx.pipeline.snapshot().pending, 0);
        assert!(fx
            .pipeline
            .with_document(|doc| doc.annotated_nodes())
            .contains(&fresh));
    }
}
