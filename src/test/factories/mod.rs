//! Builders for members and in-memory units used across unit tests.

pub mod members;
pub mod metadata;
