//! Integer money arithmetic.
//!
//! Prices, discounts, and subtotals are whole currency units stored as
//! `BIGINT`. There is no fractional part and no currency code; the catalog
//! runs in a single currency.

/// Subtotal for a cart line: `price × quantity − discount`, floored at zero.
///
/// The discount is applied once per call and is not validated against the
/// line value. A discount larger than `price × quantity` yields zero rather
/// than a negative amount. Multiplication saturates instead of overflowing.
///
/// ```
/// use catalog_core::line_subtotal;
///
/// assert_eq!(line_subtotal(250, 3, 100), 650);
/// assert_eq!(line_subtotal(10, 2, 500), 0);
/// ```
#[must_use]
pub fn line_subtotal(price: i64, quantity: i32, discount: i64) -> i64 {
    price
        .saturating_mul(i64::from(quantity))
        .saturating_sub(discount)
        .max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_subtotal_without_discount() {
        assert_eq!(line_subtotal(1999, 2, 0), 3998);
    }

    #[test]
    fn test_subtotal_discount_equal_to_line_value() {
        assert_eq!(line_subtotal(50, 4, 200), 0);
    }

    #[test]
    fn test_subtotal_saturates() {
        assert_eq!(line_subtotal(i64::MAX, 2, 0), i64::MAX);
    }

    proptest! {
        #[test]
        fn subtotal_is_never_negative(
            price in 0_i64..1_000_000,
            quantity in 1_i32..10_000,
            discount in -1_000_000_i64..100_000_000,
        ) {
            let subtotal = line_subtotal(price, quantity, discount);
            prop_assert!(subtotal >= 0);
            prop_assert_eq!(subtotal, (price * i64::from(quantity) - discount).max(0));
        }
    }
}
