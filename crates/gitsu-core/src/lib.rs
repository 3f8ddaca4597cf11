//! Core types for the gitsu dependency resolution engine.
//!
//! This crate provides foundational types shared across the engine:
//! - The [`Endpoint`] model and its derived identity tuple.
//! - [`compat`], the Compatibility Oracle.
//! - [`Manifest`], the `gitsu.json` schema the core reads and writes.
//! - [`version`], `npm`-style semver ranges over [`semver::Version`].
//! - [`error`], the shared error taxonomy.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod compat;
pub mod endpoint;
pub mod error;
pub mod json;
pub mod manifest;
pub mod version;

pub use endpoint::{Endpoint, EndpointId, Identity, Target};
pub use error::{Error, Result};
pub use json::{from_json, from_json_slice, to_json, to_json_pretty};
pub use manifest::Manifest;
pub use version::VersionRange;

pub use ahash::{AHashMap, AHashSet};
pub use semver::Version;
