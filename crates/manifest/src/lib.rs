//! # Manifest
//!
//! In-memory model of structured project manifests (`dbt_project.yml` and
//! friends) with YAML round-tripping and semantic change detection.
//!
//! This crate provides:
//! - [`Node`]: an ordered tree of scalars, sequences and mappings
//! - YAML parsing and emission that preserves key order
//! - [`canonicalize`] / [`equivalent`]: comparison that ignores key order
//!   and scalar spelling, so reformatting never counts as a change
//! - [`fingerprint`]: a BLAKE3 digest of the canonical form
//!
//! ## Example
//!
//! ```
//! let on_disk = manifest::from_str("name: pkg\nconfig-version: 2\n")?;
//! let rendered = manifest::from_str("config-version: '2'\nname: pkg\n")?;
//!
//! assert!(manifest::equivalent(&on_disk, &rendered));
//! assert_eq!(manifest::fingerprint(&on_disk), manifest::fingerprint(&rendered));
//! # Ok::<(), manifest::Error>(())
//! ```

mod canonical;
mod error;
mod node;
mod yaml;

pub use canonical::{Canonical, canonicalize, equivalent, fingerprint};
pub use error::{Error, Result};
pub use node::{KeyPath, Mapping, Node, NodeKind, Scalar};
pub use yaml::{from_str, from_value, load, to_string};
