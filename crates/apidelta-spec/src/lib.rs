//! apidelta document model
//!
//! Plain-tree view of OpenAPI/Swagger documents and the keys used to address
//! their operations.
//!
//! # Core Concepts
//!
//! - [`SpecDocument`]: reference-resolved document tree
//! - [`PathKey`], [`MethodKey`], [`OperationId`]: operation addressing and slugs
//! - [`Fragment`]: standalone single-operation spec
//! - [`canonical`]: order-insensitive structural comparison
//! - [`ContentHash`]: Blake3 checksums and structural fingerprints
//!
//! # Example
//!
//! ```rust
//! use apidelta_spec::OperationId;
//!
//! let id = OperationId::new("/pet/{petId}", "get");
//! assert_eq!(id.slug(), "pet_petId_GET");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod canonical;
mod document;
mod fragment;
mod hash;
mod key;

pub use canonical::{canonicalize, structurally_equal};
pub use document::{DocumentError, Operation, SpecDocument};
pub use fragment::{Fragment, FragmentContext};
pub use hash::{ContentHash, HashError};
pub use key::{MethodKey, OperationId, PathKey, HTTP_METHODS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
