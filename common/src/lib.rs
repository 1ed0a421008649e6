//! Cross-crate primitives shared by the wmediumd connector workspace.
//!
//! Every error enum in the workspace carries an [`ErrorLocation`] so that a
//! rendered error names the exact call site that produced it.

pub mod error_location;

pub use error_location::ErrorLocation;
