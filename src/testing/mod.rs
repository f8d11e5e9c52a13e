//! Deterministic verification of captured event streams.
//!
//! Tests assert that the text a formatter produced for a live system matches
//! an expected set of records. Fields that vary between runs (timestamps,
//! PIDs, namespace ids, generated container ids) are overwritten with
//! placeholder values on both sides before comparison.

pub mod matcher;
pub mod normalize;

pub use matcher::{expect_entries_to_match, parse_records, MatchError};
pub use normalize::{
    normalize_common_data, normalize_field, normalize_int, normalize_string, NORMALIZED_INT,
    NORMALIZED_STR,
};
