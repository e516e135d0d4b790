//! apidelta path differ
//!
//! Classifies what changed between two resolved revisions of an API
//! description, at path granularity:
//!
//! - **added**: path templates only in the newer revision
//! - **updated**: paths in both whose subtree differs, ignoring key and
//!   sequence order
//! - **deleted**: operation slugs whose method disappeared, whether the
//!   whole path went away or only that method
//!
//! # Example
//!
//! ```rust
//! use apidelta_diff::PathDiffer;
//! use apidelta_spec::SpecDocument;
//! use serde_json::json;
//!
//! let old = SpecDocument::new(json!({"paths": {"/pet": {"get": {}, "post": {}}}})).unwrap();
//! let new = SpecDocument::new(json!({"paths": {"/pet": {"get": {}}, "/store": {"get": {}}}})).unwrap();
//!
//! let diff = PathDiffer::new().diff(&old, &new);
//! assert!(diff.added.iter().any(|p| p.as_str() == "/store"));
//! assert!(diff.deleted.contains("pet_POST"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod change;
mod differ;
mod result;

pub use change::PathChange;
pub use differ::PathDiffer;
pub use result::DiffResult;
