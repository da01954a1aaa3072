//! Core domain types shared across the PDOFlow workspace.
//!
//! This crate contains:
//! - Resource identifiers (`ResourceId`)
//! - The `Status` enum shared by `Posting` and `JobRecord`
//! - The data model: `Posting`, `JobRecord`, `JobProfile`, `Function`,
//!   `FunctionStat`, `FunctionCallMap`
//! - The workspace-wide `Error`/`Result`

pub mod error;
pub mod id;
pub mod model;
pub mod status;

pub use error::{Error, Result};
pub use id::ResourceId;
pub use model::{Function, FunctionCallMap, FunctionStat, JobProfile, JobRecord, Posting};
pub use status::Status;
