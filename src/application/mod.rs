//! Application services layer.

pub mod error;
pub mod invalidation;
pub mod pagination;
pub mod repos;
pub mod sessions;
