//! Row types mapping database records to domain entities.

pub mod prompt;
