//! # MSUB Common Library
//!
//! Shared code for the manuscript submission platform services:
//! - Submission, file, and audit models
//! - Database initialization and schema
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
