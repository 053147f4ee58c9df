//! Domain layer types.

pub mod articles;
pub mod entities;
