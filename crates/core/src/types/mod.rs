//! Core types for Scoop.
//!
//! This module provides type-safe wrappers for the catalog and customer domain.

pub mod discount;
pub mod email;
pub mod id;
pub mod pricing;
pub mod role;

pub use discount::DiscountWindow;
pub use email::{Email, EmailError};
pub use id::*;
pub use pricing::{BundlePricing, savings_percentage};
pub use role::{RoleError, UserRole};
