use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

use crate::domain::{CommentCandidate, QueueSnapshot};

/// FIFO of candidates waiting for classification, unique by fingerprint.
///
/// Every operation takes the lock once and never awaits while holding it, so
/// a scan and a drain interleaving at tick granularity cannot lose or
/// duplicate items.
#[derive(Debug)]
pub struct PendingQueue<N> {
    inner: Mutex<QueueState<N>>,
}

#[derive(Debug)]
struct QueueState<N> {
    items: VecDeque<CommentCandidate<N>>,
    fingerprints: HashSet<String>,
}

impl<N> PendingQueue<N> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueState {
                items: VecDeque::new(),
                fingerprints: HashSet::new(),
            }),
        }
    }

    /// Appends `candidate` unless its fingerprint is already waiting.
    pub fn push(&self, candidate: CommentCandidate<N>) -> bool {
        let mut state = self.inner.lock();
        if !state.fingerprints.insert(candidate.fingerprint.clone()) {
            return false;
        }
        state.items.push_back(candidate);
        true
    }

    #[cfg(test)]
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.inner.lock().fingerprints.contains(fingerprint)
    }

    /// Removes up to `max` items from the front, oldest first.
    pub fn take_front(&self, max: usize) -> Vec<CommentCandidate<N>> {
        let mut state = self.inner.lock();
        let count = max.min(state.items.len());
        let taken: Vec<_> = state.items.drain(..count).collect();
        for item in &taken {
            state.fingerprints.remove(&item.fingerprint);
        }
        taken
    }

    /// Puts `items` back at the front in their original order. Items whose
    /// fingerprint was queued again in the meantime are dropped.
    pub fn restore_front(&self, items: Vec<CommentCandidate<N>>) -> usize {
        let mut state = self.inner.lock();
        let mut restored = 0;
        for item in items.into_iter().rev() {
            if state.fingerprints.insert(item.fingerprint.clone()) {
                state.items.push_front(item);
                restored += 1;
            }
        }
        restored
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pending: self.len(),
        }
    }
}

impl<N> Default for PendingQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
