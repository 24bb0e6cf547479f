//! Order placement validation.
//!
//! Each requested line is checked against the product row it references.
//! Checks run in request order and the first failure wins; the caller holds
//! the product rows locked, so a line that passes here cannot be invalidated
//! by a concurrent placement.

use platform_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// The slice of a product row that placement needs, read under `FOR UPDATE`.
#[derive(Debug, Clone, FromRow)]
pub struct ProductLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
}

/// Why an order cannot be placed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("No items provided")]
    NoItems,

    #[error("Product with ID {0} does not exist")]
    UnknownProduct(Uuid),

    #[error("Product {0} is not available")]
    InactiveProduct(String),

    #[error("Not enough stock for {name}. Available: {available}")]
    InsufficientStock { name: String, available: i32 },
}

impl From<PlacementError> for AppError {
    fn from(err: PlacementError) -> Self {
        AppError::BadRequest(anyhow::anyhow!("{}", err))
    }
}

/// Validate one order line. `reserved` is the quantity of this product
/// already claimed by earlier lines of the same order, so duplicate lines
/// cannot jointly exceed stock.
pub fn check_line(
    product: Option<ProductLine>,
    product_id: Uuid,
    quantity: i32,
    reserved: i32,
) -> Result<ProductLine, PlacementError> {
    let product = product.ok_or(PlacementError::UnknownProduct(product_id))?;

    if !product.is_active {
        return Err(PlacementError::InactiveProduct(product.name));
    }

    let available = product.stock - reserved;
    if available < quantity {
        return Err(PlacementError::InsufficientStock {
            name: product.name,
            available,
        });
    }

    Ok(product)
}

/// Subtotal of one line at the captured unit price.
pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn widget(stock: i32, is_active: bool) -> ProductLine {
        ProductLine {
            product_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            price: money("19.99"),
            stock,
            is_active,
        }
    }

    #[test]
    fn missing_product_is_rejected() {
        let id = Uuid::new_v4();
        let err = check_line(None, id, 1, 0).unwrap_err();
        assert_eq!(err, PlacementError::UnknownProduct(id));
        assert_eq!(
            err.to_string(),
            format!("Product with ID {} does not exist", id)
        );
    }

    #[test]
    fn inactive_product_is_rejected() {
        let product = widget(10, false);
        let err = check_line(Some(product.clone()), product.product_id, 1, 0).unwrap_err();
        assert_eq!(err.to_string(), "Product Widget is not available");
    }

    #[test]
    fn inactive_wins_over_stock() {
        // an inactive product with zero stock reports unavailability, not stock
        let product = widget(0, false);
        let err = check_line(Some(product.clone()), product.product_id, 5, 0).unwrap_err();
        assert!(matches!(err, PlacementError::InactiveProduct(_)));
    }

    #[test]
    fn insufficient_stock_reports_available() {
        let product = widget(3, true);
        let err = check_line(Some(product.clone()), product.product_id, 5, 0).unwrap_err();
        assert_eq!(err.to_string(), "Not enough stock for Widget. Available: 3");
    }

    #[test]
    fn exact_stock_passes() {
        let product = widget(5, true);
        assert!(check_line(Some(product.clone()), product.product_id, 5, 0).is_ok());
    }

    #[test]
    fn reserved_quantity_counts_against_stock() {
        // two lines for the same product must fit the stock together
        let product = widget(5, true);
        assert!(check_line(Some(product.clone()), product.product_id, 3, 0).is_ok());

        let err = check_line(Some(product.clone()), product.product_id, 3, 3).unwrap_err();
        assert_eq!(
            err,
            PlacementError::InsufficientStock {
                name: "Widget".to_string(),
                available: 2,
            }
        );
    }

    #[test]
    fn line_total_scales_price() {
        assert_eq!(line_total(money("19.99"), 3), money("59.97"));
        assert_eq!(line_total(money("0.10"), 7), money("0.70"));
    }

    #[test]
    fn placement_error_maps_to_bad_request() {
        let err: AppError = PlacementError::NoItems.into();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("No items provided"));
    }
}
