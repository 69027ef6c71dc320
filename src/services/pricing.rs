//! Cart pricing shared by in-store sales and online orders.
//!
//! Pure computation, no I/O: callers fetch catalog rows, this module turns
//! them into priced, snapshot-ready lines and consistent totals. The totals
//! invariant `subtotal + tax - discount == total` holds by construction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::entities::product;
use crate::errors::ServiceError;

/// VAT applied to every sale and order.
pub const TAX_RATE: Decimal = dec!(0.12);

const ONE_HUNDRED: Decimal = dec!(100);

/// One cart position resolved against the catalog.
#[derive(Debug, Clone)]
pub struct LineInput<'a> {
    pub product: &'a product::Model,
    pub quantity: i32,
    pub discount_percent: Decimal,
}

/// A priced line carrying the catalog snapshot to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: uuid::Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub discount_percent: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Prices a cart. All monetary values are rounded to 2 decimal places.
pub fn price_cart(
    lines: &[LineInput<'_>],
    discount_amount: Decimal,
) -> Result<PricedCart, ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one item is required".to_string(),
        ));
    }
    if discount_amount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "discount amount must not be negative".to_string(),
        ));
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        if line.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "quantity for product '{}' must be at least 1",
                line.product.sku
            )));
        }
        if line.discount_percent < Decimal::ZERO || line.discount_percent > ONE_HUNDRED {
            return Err(ServiceError::ValidationError(format!(
                "discount percent for product '{}' must be between 0 and 100",
                line.product.sku
            )));
        }

        let gross = line.product.price * Decimal::from(line.quantity);
        let factor = (ONE_HUNDRED - line.discount_percent) / ONE_HUNDRED;
        let line_total = (gross * factor).round_dp(2);
        subtotal += line_total;

        priced.push(PricedLine {
            product_id: line.product.id,
            product_name: line.product.name.clone(),
            product_sku: line.product.sku.clone(),
            unit_price: line.product.price,
            quantity: line.quantity,
            discount_percent: line.discount_percent,
            line_total,
        });
    }

    let subtotal = subtotal.round_dp(2);
    let tax_amount = (subtotal * TAX_RATE).round_dp(2);
    let total_amount = subtotal + tax_amount - discount_amount;

    if total_amount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "discount {} exceeds the cart total",
            discount_amount
        )));
    }

    Ok(PricedCart {
        lines: priced,
        subtotal,
        discount_amount,
        tax_amount,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use uuid::Uuid;

    fn product(price: Decimal) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: "Whey Protein 2lb".to_string(),
            sku: "WP-2LB".to_string(),
            price,
            stock_quantity: 100,
            min_stock: 5,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn five_units_at_ten_with_twelve_percent_tax() {
        let p = product(dec!(10.00));
        let cart = price_cart(
            &[LineInput {
                product: &p,
                quantity: 5,
                discount_percent: Decimal::ZERO,
            }],
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(cart.subtotal, dec!(50.00));
        assert_eq!(cart.tax_amount, dec!(6.00));
        assert_eq!(cart.total_amount, dec!(56.00));
        assert_eq!(cart.lines[0].line_total, dec!(50.00));
    }

    #[test]
    fn totals_invariant_holds_with_line_and_cart_discounts() {
        let p = product(dec!(33.33));
        let cart = price_cart(
            &[LineInput {
                product: &p,
                quantity: 3,
                discount_percent: dec!(15),
            }],
            dec!(4.50),
        )
        .unwrap();

        assert_eq!(
            cart.subtotal + cart.tax_amount - cart.discount_amount,
            cart.total_amount
        );
    }

    #[test]
    fn empty_cart_is_rejected() {
        assert_matches!(
            price_cart(&[], Decimal::ZERO),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let p = product(dec!(10.00));
        assert_matches!(
            price_cart(
                &[LineInput {
                    product: &p,
                    quantity: 0,
                    discount_percent: Decimal::ZERO,
                }],
                Decimal::ZERO,
            ),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn discount_exceeding_total_is_rejected() {
        let p = product(dec!(10.00));
        assert_matches!(
            price_cart(
                &[LineInput {
                    product: &p,
                    quantity: 1,
                    discount_percent: Decimal::ZERO,
                }],
                dec!(100.00),
            ),
            Err(ServiceError::ValidationError(_))
        );
    }
}
