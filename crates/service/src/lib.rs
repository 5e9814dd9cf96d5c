//! Service layer for the storefront backend.
//! - File-backed document collections behind the `DocumentStore` trait.
//! - Printify upstream client behind the `PrintifyApi` trait.
//! - Domain services (compliance, mockups, tracking, bulk operations,
//!   shipping quotes, merchandise/order validation) built on both.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod pagination;
pub mod printify;
pub mod compliance;
pub mod mockups;
pub mod tracking;
pub mod bulk;
pub mod shipping;
pub mod merch;
#[cfg(test)]
pub mod test_support;
