pub mod orchestrator;
pub mod queries;
pub mod resolver;
pub mod scoring;

pub use orchestrator::{PipelineParams, RepostFinder, find_reposts};
pub use queries::{QueryGenerator, generate_queries};
pub use resolver::{CandidateCache, CandidateResolver};
pub use scoring::{Scorer, score};
