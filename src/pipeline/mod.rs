/// The scoring pipeline: normalizer, contrastive segmenter, topic classifier,
/// sentiment scorer, and the orchestrator that chains them per record.
///
/// Every stage borrows the shared [`crate::config::Resources`] read-only and
/// is a total function over its input.
pub mod classifier;
pub mod normalizer;
pub mod orchestrator;
pub mod scorer;
pub mod segmenter;

pub use orchestrator::{Pipeline, RunReport};
