pub mod entry;
pub mod job;
