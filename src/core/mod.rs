// Core algorithm exports
pub mod compat;
pub mod matcher;
pub mod reason;

pub use compat::{is_compatible, matches_domain_criteria};
pub use matcher::{rank_offers, MatchEngine, MatchError};
pub use reason::{build_reason, FULL_COMPATIBILITY};
