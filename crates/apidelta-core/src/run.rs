//! Run identity
//!
//! Every pipeline execution gets a [`RunId`]; its fragment directory is
//! derived from it rather than from the wall clock alone.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunId {
    id: Ulid,
    started_at: DateTime<Utc>,
}

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(Ulid::new(), Utc::now())
    }

    /// Assemble from known parts
    #[inline]
    #[must_use]
    pub fn from_parts(id: Ulid, started_at: DateTime<Utc>) -> Self {
        Self { id, started_at }
    }

    /// The ULID
    #[inline]
    #[must_use]
    pub fn ulid(&self) -> Ulid {
        self.id
    }

    /// When the run started
    #[inline]
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// `fragments_<YYYYMMDD_HHMMSS>_<ulid>`
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!(
            "fragments_{}_{}",
            self.started_at.format("%Y%m%d_%H%M%S"),
            self.id.to_string().to_ascii_lowercase()
        )
    }

    /// Fragment directory for this run under `root`
    #[inline]
    #[must_use]
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(self.dir_name())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
