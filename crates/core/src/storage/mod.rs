//! Receipt storage for expenses using Apache OpenDAL.
//!
//! Receipts live under `receipts/{expense_id}/{sanitized_filename}` in either
//! a local directory (development) or an S3-compatible bucket.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               Apache OpenDAL                 │
//! ├──────────────────────────────────────────────┤
//! │ op.write(key, bytes)  │ op.read(key)         │
//! │ op.delete(key)        │ op.stat(key)         │
//! └──────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{ReceiptMetadata, StorageService};
