//! `shopworks-catalog` — catalog domain: products, discounts, reviews.
//!
//! Pure domain logic (no IO). The store layer in `shopworks-infra` persists
//! these types and mirrors the queries defined here (notably the
//! active-discount resolution) in SQL.

pub mod discount;
pub mod import;
pub mod product;
pub mod review;

pub use discount::{Discount, active_discount, validate_discount, validate_no_overlap};
pub use import::{IMPORT_COLUMNS, ProductRow, parse_rows, validate_header};
pub use product::{NewProduct, Product, discounted_unit_price};
pub use review::{Review, average_rating};
