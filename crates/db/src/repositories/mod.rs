//! Repository layer.

pub mod prompt_repo;
