//! navmatch: canonical search-URL matching for real-estate sites.
//!
//! A URL goes through the tokenizer, the location resolver and the site
//! dialect's extractor and normalizer, and comes out as a [`SearchRecord`].
//! The match engine compares two records under a [`MatchPolicy`], and a
//! [`Verifier`] scores an agent URL against ground-truth alternatives.

pub mod extract;
pub mod location;
pub mod matcher;
pub mod normalize;
pub mod session;
pub mod sites;
pub mod tokenizer;
pub mod types;

pub use location::LocationRule;
pub use matcher::{compare, ExtraPolicy, MatchPolicy, ReportMode, SetPolicy};
pub use session::{verify_once, GroundTruth, GroundTruthInput, UpdateOutcome, Verifier};
pub use sites::{Dialect, Site};
pub use tokenizer::{tokenize, TokenizedUrl};
pub use types::*;
