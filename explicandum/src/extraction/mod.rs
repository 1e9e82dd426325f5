pub mod conflict;
pub mod extractor;
pub mod types;

pub use conflict::TopicMatcher;
pub use extractor::StanceExtractor;
pub use types::ProposedStance;
