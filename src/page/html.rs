use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};

use super::Document;
use crate::domain::Annotation;

/// Handle into an [`HtmlDocument`]: pre-order position plus the snapshot
/// generation it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle {
    generation: u64,
    index: usize,
}

struct SnapshotSource {
    path: PathBuf,
    modified: Option<SystemTime>,
}

/// Host adapter over a parsed HTML snapshot.
///
/// Seen markers and annotations live in an overlay keyed by node position.
/// Swapping the snapshot is a host re-render: the generation is bumped, the
/// overlay is cleared and every older handle goes stale.
pub struct HtmlDocument {
    html: Html,
    generation: u64,
    subtree_end: Vec<usize>,
    marked: HashSet<usize>,
    annotations: HashMap<usize, Annotation>,
    source: Option<SnapshotSource>,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let subtree_end = index_subtrees(&html);
        Self {
            html,
            generation: 0,
            subtree_end,
            marked: HashSet::new(),
            annotations: HashMap::new(),
            source: None,
        }
    }

    /// Loads a snapshot file and keeps watching it through [`Document::refresh`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let body = fs::read_to_string(&path)
            .with_context(|| format!("failed to read page snapshot {}", path.display()))?;
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        let mut doc = Self::parse(&body);
        doc.source = Some(SnapshotSource { path, modified });
        Ok(doc)
    }

    pub fn replace(&mut self, source: &str) {
        self.html = Html::parse_document(source);
        self.subtree_end = index_subtrees(&self.html);
        self.generation += 1;
        self.marked.clear();
        self.annotations.clear();
        tracing::debug!(target: "page", generation = self.generation, "document replaced");
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn annotation(&self, node: &NodeHandle) -> Option<&Annotation> {
        self.live_index(node)
            .and_then(|index| self.annotations.get(&index))
    }

    pub fn annotations(&self) -> impl Iterator<Item = (NodeHandle, &Annotation)> + '_ {
        self.annotations
            .iter()
            .map(|(index, annotation)| (self.handle(*index), annotation))
    }

    fn handle(&self, index: usize) -> NodeHandle {
        NodeHandle {
            generation: self.generation,
            index,
        }
    }

    fn live_index(&self, node: &NodeHandle) -> Option<usize> {
        (node.generation == self.generation && node.index < self.subtree_end.len())
            .then_some(node.index)
    }

    fn element(&self, node: &NodeHandle) -> Option<ElementRef<'_>> {
        let index = self.live_index(node)?;
        self.html
            .tree
            .root()
            .descendants()
            .nth(index)
            .and_then(ElementRef::wrap)
    }
}

impl Document for HtmlDocument {
    type Node = NodeHandle;

    fn refresh(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        let path = source.path.clone();
        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => Some(modified),
            Err(err) => {
                tracing::warn!(target: "page", error = %err, path = %path.display(), "snapshot not readable");
                return;
            }
        };
        if modified == source.modified {
            return;
        }
        match fs::read_to_string(&path) {
            Ok(body) => {
                self.replace(&body);
                if let Some(source) = self.source.as_mut() {
                    source.modified = modified;
                }
                tracing::info!(target: "page", path = %path.display(), generation = self.generation, "snapshot reloaded");
            }
            Err(err) => {
                tracing::warn!(target: "page", error = %err, path = %path.display(), "failed to reload snapshot");
            }
        }
    }

    fn query(&self, selector: &str) -> Vec<NodeHandle> {
        let Ok(parsed) = Selector::parse(selector) else {
            tracing::debug!(target: "page", selector, "ignoring unparsable selector");
            return Vec::new();
        };
        self.html
            .tree
            .root()
            .descendants()
            .enumerate()
            .filter_map(|(index, node)| {
                let element = ElementRef::wrap(node)?;
                parsed.matches(&element).then(|| self.handle(index))
            })
            .collect()
    }

    fn contains(&self, outer: &NodeHandle, inner: &NodeHandle) -> bool {
        match (self.live_index(outer), self.live_index(inner)) {
            (Some(outer), Some(inner)) => outer < inner && inner < self.subtree_end[outer],
            _ => false,
        }
    }

    fn first_text(&self, node: &NodeHandle, selector: &str) -> Option<String> {
        let element = self.element(node)?;
        let parsed = Selector::parse(selector).ok()?;
        let found = element.select(&parsed).next()?;
        let text = found.text().collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn is_marked(&self, node: &NodeHandle) -> bool {
        self.live_index(node)
            .is_some_and(|index| self.marked.contains(&index))
    }

    fn mark(&mut self, node: &NodeHandle) {
        if let Some(index) = self.live_index(node) {
            self.marked.extend(index..self.subtree_end[index]);
        }
    }

    fn annotate(&mut self, node: &NodeHandle, annotation: &Annotation) {
        match self.live_index(node) {
            Some(index) => {
                self.annotations
                    .entry(index)
                    .or_insert_with(|| annotation.clone());
            }
            None => {
                tracing::debug!(target: "page", ?node, "skipping annotation for stale node");
            }
        }
    }
}

/// For every node in pre-order, the exclusive end of its subtree range.
fn index_subtrees(html: &Html) -> Vec<usize> {
    let nodes: Vec<_> = html.tree.root().descendants().collect();
    let position: HashMap<_, usize> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id(), index))
        .collect();

    let mut size = vec![1usize; nodes.len()];
    for index in (0..nodes.len()).rev() {
        if let Some(parent) = nodes[index].parent() {
            if let Some(&parent_index) = position.get(&parent.id()) {
                size[parent_index] += size[index];
            }
        }
    }
    size.iter()
        .enumerate()
        .map(|(index, size)| index + size)
        .collect()
}
