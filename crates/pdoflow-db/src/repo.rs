//! Repository traits and PostgreSQL implementations.

pub mod job_record;
pub mod posting;
pub mod profile;

pub use job_record::{JobRecordRepo, NewJobRecord, PgJobRecordRepo, PriorityStat};
pub use posting::{PgPostingRepo, PostingCounts, PostingRepo};
pub use profile::{CallEdgeRow, PgProfileRepo, ProfileRepo, ReducedProfile, StatRow};
