//! Core traits for dynzone
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`DnsProvider`]: List zones/records and update records via provider APIs
//! - [`CacheStore`]: Durable last-applied state

pub mod ip_source;
pub mod dns_provider;
pub mod cache_store;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, RecordMap, RecordUpdate, RemoteRecord, ZoneMap};
pub use cache_store::CacheStore;
