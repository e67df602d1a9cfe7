//! External system integrations for tabex.
//!
//! - [`storage`] - object storage targets for finished exports
//!
//! # Design Pattern
//!
//! Adapters isolate external systems behind traits so that exporters can be
//! tested against in-memory implementations.
//!
//! ```rust,no_run
//! use tabex::adapters::storage::{FileStorage, LocalStorage};
//!
//! let storage = LocalStorage::new("/var/www/exports", "https://files.example.com/exports");
//! assert_eq!(storage.url("a_0.csv"), "https://files.example.com/exports/a_0.csv");
//! ```

pub mod storage;
