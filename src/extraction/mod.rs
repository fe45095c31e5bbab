//! Job extraction
//!
//! Strategy extractors turn one listing page into raw candidates; the
//! normalizer maps them onto [`JobRecord`].

pub mod chain;
pub mod dom;
pub mod hydration;
pub mod intercepted;
pub mod json_ld;
pub mod lookup;
pub mod normalizer;
pub mod schema;

pub use chain::{ChainOutcome, ParsedPage, StrategyChain, StrategyExtractor};
pub use normalizer::Normalizer;
pub use schema::{ExtractionMethod, InterceptedResponse, JobRecord, PageSource, RawJobCandidate};
