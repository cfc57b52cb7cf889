//! Pipeline stages for the mental-health survey warehouse.
//!
//! Each stage in [`stages`] is a standalone batch job. Stages that touch the
//! warehouse are generic over the store traits in `salud_core::store`, so the
//! same code runs against [`salud_store_sqlite::SqliteWarehouse`] or a test
//! double.

pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod stages;

pub use config::EtlConfig;
pub use error::{Error, Result};
