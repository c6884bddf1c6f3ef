//! Item catalog: reusable products and services that prefill line items.

pub mod item;

pub use item::{CatalogItem, DEFAULT_GROUP, DEFAULT_UNIT};
