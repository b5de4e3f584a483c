//! Planting Recommendation Engine
//!
//! Compares a record's spacing and area against agronomic reference ranges
//! for its crop sub-type and produces a structured recommendation report.
//!
//! ## Architecture
//! - `tables.rs` - embedded reference profiles per cycle/variety
//! - `comparator.rs` - below/within/above range classification
//! - `report.rs` - ValidationReport output structs
//! - `validator.rs` - message generation and report assembly

pub mod tables;
pub mod comparator;
pub mod report;
pub mod validator;

pub use tables::{RangeSpec, SubTypeProfile, TABLES_VERSION};
pub use comparator::{RangeFit, RangeComparison, compare_to_range};
pub use report::{ValidationReport, ParameterCheck, IrrigationAdvice, RecommendedRange, SubTypeInfo};
pub use validator::{validate, validate_sub_type};
