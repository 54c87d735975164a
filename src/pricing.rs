//! Money is kept in integer minor units throughout.

pub const MAX_DISCOUNT_PERCENT: i32 = 100;

/// Largest accepted product price.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// Unit price after the product discount. Integer division rounds in the
/// customer's favour.
pub fn final_price(price: i64, discount_percent: i32) -> i64 {
    let discount = discount_percent.clamp(0, MAX_DISCOUNT_PERCENT) as i128;
    let price = price as i128;
    // Never exceeds `price`, so the narrowing is lossless.
    (price - price * discount / 100) as i64
}

/// Saturates at `i64::MAX`; checkout rejects totals that large.
pub fn line_total(unit_price: i64, quantity: i32) -> i64 {
    unit_price.saturating_mul(quantity as i64)
}

pub fn valid_price(price: i64) -> bool {
    (0..=MAX_PRICE).contains(&price)
}

pub fn valid_discount(discount_percent: i32) -> bool {
    (0..=MAX_DISCOUNT_PERCENT).contains(&discount_percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_is_applied_and_rounded_down() {
        assert_eq!(final_price(1000, 0), 1000);
        assert_eq!(final_price(1000, 15), 850);
        assert_eq!(final_price(999, 10), 900);
        assert_eq!(final_price(1000, 100), 0);
    }

    #[test]
    fn out_of_range_discount_is_clamped() {
        assert_eq!(final_price(1000, 150), 0);
        assert_eq!(final_price(1000, -5), 1000);
        assert!(!valid_discount(101));
        assert!(!valid_discount(-1));
        assert!(valid_discount(100));
    }

    #[test]
    fn line_total_multiplies_quantity() {
        assert_eq!(line_total(850, 3), 2550);
        assert_eq!(line_total(i64::MAX / 2, 3), i64::MAX);
    }

    #[test]
    fn large_prices_do_not_overflow() {
        assert_eq!(final_price(i64::MAX / 10, 50), i64::MAX / 10 - (i64::MAX / 10) / 2);
        assert_eq!(final_price(i64::MAX, 0), i64::MAX);
        assert_eq!(final_price(i64::MAX, 100), 0);
        assert!(valid_price(MAX_PRICE));
        assert!(!valid_price(MAX_PRICE + 1));
        assert!(!valid_price(-1));
    }
}
