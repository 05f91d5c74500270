//! Catalog module.
//!
//! Contains the externally supplied product records and a read-only view over them.

mod product;
mod view;

pub use product::{ColorVariant, Product, LOW_STOCK_THRESHOLD};
pub use view::CatalogView;
