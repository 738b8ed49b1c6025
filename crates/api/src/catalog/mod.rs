//! Category aggregation: one outer join, reassembled into a nested tree.
//!
//! [`row`] splits each flat join row into per-entity field groups and
//! [`assembler`] folds the ordered rows into categories → products →
//! {variants, additional images, bundles}.

pub mod assembler;
pub mod row;

pub use assembler::CatalogAssembler;
pub use row::{CatalogRow, ProductFields};
