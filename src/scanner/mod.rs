//! Fixture discovery and the end-to-end scan run.

pub mod catalog;
pub mod discovery;
pub mod pipeline;
