//! Bulk product import contract.
//!
//! The upload plumbing lives outside this crate; what is specified here is
//! the tabular contract: exactly four columns, `name, price, description,
//! inventory`, in that order. A file with any other header set or order is
//! rejected before a single row is parsed, and row parsing is all-or-nothing
//! so a half-imported file never reaches the store.

use std::str::FromStr;

use rust_decimal::Decimal;

use shopworks_core::{DomainError, DomainResult};

use crate::product::NewProduct;

/// Required header, in order.
pub const IMPORT_COLUMNS: [&str; 4] = ["name", "price", "description", "inventory"];

/// One raw tabular row: cells as received, `None` for empty cells.
pub type ProductRow = Vec<Option<String>>;

/// Validate the header row against the required contract.
pub fn validate_header(header: &[String]) -> DomainResult<()> {
    let normalized: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    if normalized != IMPORT_COLUMNS {
        return Err(DomainError::validation(format!(
            "file must contain exactly the columns {:?} in that order",
            IMPORT_COLUMNS
        )));
    }
    Ok(())
}

/// Parse all data rows into product candidates.
///
/// Fails on the first invalid row, naming it; nothing is returned unless
/// every row parses and validates.
pub fn parse_rows(rows: &[ProductRow]) -> DomainResult<Vec<NewProduct>> {
    let mut products = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        products.push(parse_row(row).map_err(|e| match e {
            DomainError::Validation(msg) => {
                DomainError::validation(format!("row {}: {}", index + 2, msg))
            }
            other => other,
        })?);
    }
    Ok(products)
}

fn parse_row(row: &ProductRow) -> DomainResult<NewProduct> {
    if row.len() != IMPORT_COLUMNS.len() {
        return Err(DomainError::validation(format!(
            "expected {} cells, found {}",
            IMPORT_COLUMNS.len(),
            row.len()
        )));
    }

    let cell = |i: usize| row[i].as_deref().unwrap_or("").trim().to_string();

    let price = Decimal::from_str(&cell(1))
        .map_err(|_| DomainError::validation("price must be a decimal number"))?;
    let inventory: u32 = cell(3)
        .parse()
        .map_err(|_| DomainError::validation("inventory must be a non-negative integer"))?;

    let candidate = NewProduct {
        name: cell(0),
        price,
        description: cell(2),
        inventory,
    };
    candidate.validate()?;
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn row(cells: &[&str]) -> ProductRow {
        cells.iter().map(|c| Some(c.to_string())).collect()
    }

    #[test]
    fn exact_header_is_accepted() {
        assert!(validate_header(&header(&["name", "price", "description", "inventory"])).is_ok());
        // Case and surrounding whitespace are tolerated; order is not.
        assert!(validate_header(&header(&["Name", " Price", "description", "inventory "])).is_ok());
    }

    #[test]
    fn wrong_order_or_extra_columns_are_rejected() {
        assert!(validate_header(&header(&["price", "name", "description", "inventory"])).is_err());
        assert!(
            validate_header(&header(&["name", "price", "description", "inventory", "sku"]))
                .is_err()
        );
        assert!(validate_header(&header(&["name", "price", "description"])).is_err());
    }

    #[test]
    fn rows_parse_into_candidates() {
        let rows = vec![
            row(&["Lamp", "19.99", "desk lamp", "3"]),
            row(&["Chair", "120.00", "", "0"]),
        ];
        let products = parse_rows(&rows).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Lamp");
        assert_eq!(products[1].inventory, 0);
    }

    #[test]
    fn one_bad_row_rejects_the_whole_file() {
        let rows = vec![
            row(&["Lamp", "19.99", "ok", "3"]),
            row(&["Chair", "lots", "bad price", "1"]),
        ];
        let err = parse_rows(&rows).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("row 3")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
