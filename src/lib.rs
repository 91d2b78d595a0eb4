//! Vitrina: catalog and exchange-rate caching service for a storefront.
//!
//! The service owns three independent TTL-bound in-memory caches (products,
//! categories, exchange rates), a pure currency conversion engine with cart
//! aggregation, a bounded response cache in front of the public catalog
//! routes, and an invalidation coordinator that fans a single refresh event
//! out to both cache layers.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
