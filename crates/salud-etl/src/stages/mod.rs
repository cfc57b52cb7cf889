//! The pipeline stages, in run order.
//!
//! Each stage is independent: it reads its input from a file or from the
//! warehouse and leaves its output there for the next one.

pub mod clean;
pub mod dimensions;
pub mod export;
pub mod facts;
pub mod staging;
pub mod validate;

use salud_core::store::{Table, Warehouse};

use crate::{Error, Result};

/// Fail with [`Error::MissingTable`] unless `table` exists.
pub(crate) async fn require_table<W: Warehouse>(warehouse: &W, table: Table) -> Result<()> {
  if warehouse.table_exists(table).await.map_err(Error::store)? {
    Ok(())
  } else {
    Err(Error::MissingTable(table.name()))
  }
}
