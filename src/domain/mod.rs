pub mod measurement;
pub mod schedule;
