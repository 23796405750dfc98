//! Fakes shared by the unit tests.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::json;

use crate::{
    ai::{inference::interpret_response, BatchItem, ClassifyError, Classifier},
    db::ScoreCache,
    domain::{Annotation, ClassificationResult, Settings},
    infrastructure::settings::{normalize, SettingsSource},
    page::{Document, ExtractionStrategy},
    tasks::{
        extractor::{CandidateLimits, Extractor},
        pipeline::Pipeline,
    },
};

pub const CONTAINER: &str = "comment";
pub const IDENTITY: &str = "author";
pub const CONTENT: &str = "body";

#[derive(Debug)]
struct FakeNode {
    parent: Option<usize>,
    removed: bool,
    identity: String,
    content: String,
}

/// Flat document where every node is a comment container.
#[derive(Debug, Default)]
pub struct FakeDocument {
    nodes: Vec<FakeNode>,
    marked: HashSet<usize>,
    annotated: Vec<(usize, Annotation)>,
    calls: usize,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&mut self, parent: Option<usize>, identity: &str, content: &str) -> usize {
        self.nodes.push(FakeNode {
            parent,
            removed: false,
            identity: identity.to_string(),
            content: content.to_string(),
        });
        self.nodes.len() - 1
    }

    /// Host removes `node` and its subtree.
    pub fn remove(&mut self, node: usize) {
        for id in 0..self.nodes.len() {
            if id == node || self.is_descendant(node, id) {
                self.nodes[id].removed = true;
            }
        }
    }

    pub fn annotated_nodes(&self) -> Vec<usize> {
        self.annotated.iter().map(|(node, _)| *node).collect()
    }

    pub fn annotation_calls(&self) -> usize {
        self.calls
    }

    fn live(&self, node: usize) -> Option<&FakeNode> {
        self.nodes.get(node).filter(|n| !n.removed)
    }

    fn is_descendant(&self, outer: usize, inner: usize) -> bool {
        let mut current = self.nodes.get(inner).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }
}

impl Document for FakeDocument {
    type Node = usize;

    fn query(&self, selector: &str) -> Vec<usize> {
        if selector != CONTAINER {
            return Vec::new();
        }
        (0..self.nodes.len())
            .filter(|id| self.live(*id).is_some())
            .collect()
    }

    fn contains(&self, outer: &usize, inner: &usize) -> bool {
        self.is_descendant(*outer, *inner)
    }

    fn first_text(&self, node: &usize, selector: &str) -> Option<String> {
        let node = self.live(*node)?;
        let text = match selector {
            IDENTITY => node.identity.clone(),
            CONTENT => node.content.clone(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    fn is_marked(&self, node: &usize) -> bool {
        self.marked.contains(node)
    }

    fn mark(&mut self, node: &usize) {
        if self.live(*node).is_none() {
            return;
        }
        for id in 0..self.nodes.len() {
            if id == *node || self.is_descendant(*node, id) {
                self.marked.insert(id);
            }
        }
    }

    fn annotate(&mut self, node: &usize, annotation: &Annotation) {
        self.calls += 1;
        if self.live(*node).is_none() || self.annotated.iter().any(|(id, _)| id == node) {
            return;
        }
        self.annotated.push((*node, annotation.clone()));
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, ClassificationResult>>,
    writes: AtomicUsize,
}

impl MemoryCache {
    /// Seeds an entry without counting it as a pipeline write.
    pub fn insert(&self, fingerprint: &str, result: ClassificationResult) {
        self.entries.lock().insert(fingerprint.to_string(), result);
    }

    pub fn get_sync(&self, fingerprint: &str) -> Option<ClassificationResult> {
        self.entries.lock().get(fingerprint).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreCache for MemoryCache {
    async fn get(&self, fingerprint: &str) -> Option<ClassificationResult> {
        self.get_sync(fingerprint)
    }

    async fn put(&self, fingerprint: &str, result: &ClassificationResult) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(fingerprint, result.clone());
    }
}

/// Replays canned HTTP responses through the real response interpreter.
/// With nothing scripted every item scores 7.
#[derive(Default)]
pub struct FakeClassifier {
    responses: Mutex<VecDeque<(u16, String)>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl FakeClassifier {
    pub fn respond(&self, status: u16, body: String) {
        self.responses.lock().push_back((status, body));
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(
        &self,
        _credential: &str,
        items: &[BatchItem<'_>],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        self.batches
            .lock()
            .push(items.iter().map(|i| i.identity.to_string()).collect());
        let scripted = self.responses.lock().pop_front();
        let (status, body) = scripted.unwrap_or_else(|| {
            let verdicts: Vec<_> = items.iter().map(|_| json!({ "score": 7, "note": "" })).collect();
            (200, verdict_body(&serde_json::to_string(&verdicts).unwrap_or_default()))
        });
        interpret_response(status, &body)
    }
}

/// Wraps model text in a generateContent response envelope.
pub fn verdict_body(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
}

pub fn fake_strategy() -> ExtractionStrategy {
    ExtractionStrategy {
        version: 0,
        containers: vec![CONTAINER.to_string()],
        identity: IDENTITY.to_string(),
        content: CONTENT.to_string(),
    }
}

pub struct Fixture {
    pub pipeline: Pipeline<FakeDocument>,
    pub cache: Arc<MemoryCache>,
    pub classifier: Arc<FakeClassifier>,
    pub settings: SharedSettings,
}

impl Fixture {
    pub fn requeue_failed(self) -> Self {
        Self {
            pipeline: self.pipeline.with_requeue_failed(true),
            ..self
        }
    }
}

pub fn fixture(doc: FakeDocument) -> Fixture {
    fixture_with(
        doc,
        Settings {
            credential: Some("test-key".into()),
            ..Settings::default()
        },
    )
}

pub fn fixture_with(doc: FakeDocument, settings: Settings) -> Fixture {
    let cache = Arc::new(MemoryCache::default());
    let classifier = Arc::new(FakeClassifier::default());
    let settings = SharedSettings::new(settings);
    let pipeline = Pipeline::new(
        doc,
        Extractor::new(fake_strategy(), CandidateLimits::default()),
        cache.clone(),
        classifier.clone(),
        Arc::new(settings.clone()),
    );
    Fixture {
        pipeline,
        cache,
        classifier,
        settings,
    }
}

/// In-process settings the tests flip between ticks; clones share state.
#[derive(Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(normalize(settings))),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut guard = self.inner.write();
        f(&mut guard);
        *guard = normalize(guard.clone());
    }
}

impl SettingsSource for SharedSettings {
    fn current(&self) -> Settings {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_settings_updates_are_visible_to_clones() {
        let settings = SharedSettings::default();
        let view = settings.clone();
        settings.update(|s| {
            s.paused = true;
            s.credential = Some(String::new());
        });
        let current = view.current();
        assert!(current.paused);
        assert_eq!(current.credential, None);
    }
}
