//! Application services: cache-aside reads over the stores and the cache.

pub mod articles;
pub mod comments;
pub mod error;
pub mod repos;
