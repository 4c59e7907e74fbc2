//! Database queries for the export pipeline

pub mod audit;
pub mod files;
pub mod reviewers;
pub mod submissions;
