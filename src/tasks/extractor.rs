use std::collections::{BTreeSet, HashSet};

use crate::{
    domain::CommentCandidate,
    page::{Document, ExtractionStrategy},
};

#[derive(Debug, Clone, Copy)]
pub struct CandidateLimits {
    pub max_identity_len: usize,
    pub min_content_len: usize,
}

impl Default for CandidateLimits {
    fn default() -> Self {
        Self {
            max_identity_len: 30,
            min_content_len: 2,
        }
    }
}

impl CandidateLimits {
    fn accepts(&self, identity: &str, content: &str) -> bool {
        !identity.is_empty()
            && identity.chars().count() <= self.max_identity_len
            && content.chars().count() >= self.min_content_len
    }
}

/// Per-pass counters, logged by the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub matched: usize,
    pub already_seen: usize,
    pub overlapping: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub accepted: usize,
}

pub struct Extractor {
    strategy: ExtractionStrategy,
    limits: CandidateLimits,
}

impl Extractor {
    pub fn new(strategy: ExtractionStrategy, limits: CandidateLimits) -> Self {
        Self { strategy, limits }
    }

    pub fn strategy_version(&self) -> u32 {
        self.strategy.version
    }

    /// Runs one pass over `doc` and returns comments not seen before.
    ///
    /// Containers from every selector are merged and walked in document
    /// order, so an outer container is always considered before anything
    /// nested in it. Accepted containers and same-comment duplicates are
    /// marked seen; containers that fail validation are left alone.
    pub fn extract<D: Document>(
        &self,
        doc: &mut D,
    ) -> (Vec<CommentCandidate<D::Node>>, ExtractReport) {
        let containers: BTreeSet<D::Node> = self
            .strategy
            .containers
            .iter()
            .flat_map(|selector| doc.query(selector))
            .collect();

        let mut report = ExtractReport {
            matched: containers.len(),
            ..Default::default()
        };
        let mut accepted: Vec<D::Node> = Vec::new();
        let mut pairs: HashSet<(String, String)> = HashSet::new();
        let mut candidates = Vec::new();

        for node in containers {
            if doc.is_marked(&node) {
                report.already_seen += 1;
                continue;
            }
            if accepted
                .iter()
                .any(|kept| doc.contains(kept, &node) || doc.contains(&node, kept))
            {
                report.overlapping += 1;
                continue;
            }

            let identity = doc.first_text(&node, &self.strategy.identity);
            let content = doc.first_text(&node, &self.strategy.content);
            let (identity, content) = match (identity, content) {
                (Some(identity), Some(content)) if self.limits.accepts(&identity, &content) => {
                    (identity, content)
                }
                _ => {
                    report.invalid += 1;
                    continue;
                }
            };

            doc.mark(&node);
            if !pairs.insert((identity.clone(), content.clone())) {
                report.duplicates += 1;
                continue;
            }

            report.accepted += 1;
            accepted.push(node.clone());
            candidates.push(CommentCandidate::new(identity, content, node));
        }

        (candidates, report)
    }
}
