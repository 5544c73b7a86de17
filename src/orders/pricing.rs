//! Price aggregation
//!
//! All arithmetic is `rust_decimal::Decimal`: a line item's subtotal is
//! `quantity × unit price` and an order's total is the exact sum of its
//! subtotals. No rounding happens anywhere in this module.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::error::OrderError;

/// Check a requested quantity before anything touches storage.
///
/// Quantities are strictly positive; zero and negative values are rejected
/// with [`OrderError::InvalidQuantity`].
pub fn validate_quantity(product: Uuid, quantity: i64) -> Result<u32, OrderError> {
    if quantity <= 0 {
        return Err(OrderError::InvalidQuantity { product, quantity });
    }
    u32::try_from(quantity).map_err(|_| OrderError::InvalidQuantity { product, quantity })
}

/// Subtotal for a single line item. `None` when the product of quantity
/// and unit price is not representable.
pub fn subtotal(unit_price: Decimal, quantity: u32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity))
}

/// Total price across line-item subtotals. `None` on overflow.
pub fn total<I>(subtotals: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    subtotals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn subtotal_is_quantity_times_price() {
        assert_eq!(subtotal(dec!(9.99), 3), Some(dec!(29.97)));
        assert_eq!(subtotal(dec!(10.00), 2), Some(dec!(20.00)));
        assert_eq!(subtotal(dec!(5.50), 1), Some(dec!(5.50)));
    }

    #[test]
    fn total_sums_exactly() {
        assert_eq!(total([dec!(20.00), dec!(5.50)]), Some(dec!(25.50)));
        assert_eq!(total([dec!(0.10), dec!(0.20)]), Some(dec!(0.30)));
    }

    #[test]
    fn total_of_nothing_is_zero() {
        assert_eq!(total(std::iter::empty()), Some(Decimal::ZERO));
    }

    #[test]
    fn overflowing_arithmetic_is_reported_not_panicked() {
        assert_eq!(subtotal(Decimal::MAX, 2), None);
        assert_eq!(total([Decimal::MAX, Decimal::MAX]), None);
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        let product = Uuid::new_v4();
        assert!(matches!(
            validate_quantity(product, 0),
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            validate_quantity(product, -4),
            Err(OrderError::InvalidQuantity { quantity: -4, .. })
        ));
    }

    #[test]
    fn positive_quantities_pass_through() {
        assert_eq!(validate_quantity(Uuid::new_v4(), 7).unwrap(), 7);
    }
}
