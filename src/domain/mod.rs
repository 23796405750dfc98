pub mod candidate;
pub mod fingerprint;
pub mod types;

pub use candidate::CommentCandidate;
pub use types::{Annotation, ClassificationResult, QueueSnapshot, Settings, Tier};
