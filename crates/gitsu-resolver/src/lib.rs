//! Fetch coordination and conflict resolution: the engine that turns a set
//! of requested targets into the set of endpoints a deployer must
//! materialize.

#![warn(clippy::all)]

mod dissect;
mod engine;
mod error;
mod fetch;
mod graph;

pub use dissect::ConflictPrompter;
pub use engine::{DissectOutcome, Engine, IncompatibleSpec, TargetSpec};
pub use error::{ConflictPick, Error, FetchFailure, Result};
pub use graph::Arena;
