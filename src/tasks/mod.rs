pub mod annotator;
pub mod extractor;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod scheduler;
