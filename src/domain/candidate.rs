use super::fingerprint::fingerprint;

/// A comment pulled out of the host document that has not been resolved to a
/// score yet. `node` is a non-owning handle into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCandidate<N> {
    pub identity: String,
    pub content: String,
    pub fingerprint: String,
    pub node: N,
}

impl<N> CommentCandidate<N> {
    pub fn new(identity: impl Into<String>, content: impl Into<String>, node: N) -> Self {
        let identity = identity.into();
        let content = content.into();
        let fingerprint = fingerprint(&identity, &content);
        Self {
            identity,
            content,
            fingerprint,
            node,
        }
    }
}
