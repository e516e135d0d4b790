//! apidelta spec loading
//!
//! Reads OpenAPI/Swagger files (JSON, YAML) into reference-resolved
//! [`SpecDocument`](apidelta_spec::SpecDocument)s.
//!
//! # Pipeline
//!
//! 1. Pick a parser by file extension ([`ParserRegistry`])
//! 2. Parse into a plain tree, YAML keys stringified
//! 3. Inline internal `$ref`s ([`resolve_refs`]); self-referential schemas
//!    keep their back-edge as a literal `$ref`
//! 4. Reject null or empty roots
//!
//! # Example
//!
//! ```rust,no_run
//! use apidelta_loader::SpecLoader;
//!
//! # async fn example() -> Result<(), apidelta_loader::LoadError> {
//! let doc = SpecLoader::new().load("specs/Swagger_20240101_120000.yaml").await?;
//! println!("{} paths", doc.path_keys().len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
mod loader;
pub mod parsers;
pub mod resolve;

pub use error::{LoadError, ParseFailure, ResolveError};
pub use loader::{SpecLoader, DEFAULT_MAX_FILE_SIZE};
pub use parsers::{default_parsers, ParserRegistry, SpecParser};
pub use resolve::{resolve_refs, Resolved};
