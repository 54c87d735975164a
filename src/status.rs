use std::{fmt, str::FromStr};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Allowed moves of the order lifecycle. Everything else is rejected,
    /// including a move to the current status.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Cancelled) | (Paid, Shipped) | (Shipped, Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Active,
    Hidden,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Hidden => "hidden",
            ProductStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

macro_rules! str_enum {
    ($ty:ident, $label:literal, [$($variant:ident),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(AppError::BadRequest(format!("Invalid {}: {}", $label, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(OrderStatus, "order status", [Pending, Paid, Shipped, Completed, Cancelled]);
str_enum!(PaymentStatus, "payment status", [Unpaid, Pending, Paid, Failed]);
str_enum!(ProductStatus, "product status", [Active, Hidden, Archived]);
str_enum!(Role, "role", [User, Admin]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_lifecycle_moves_forward_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));

        assert!(!Paid.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn parses_known_values_and_rejects_others() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("hidden".parse::<ProductStatus>().unwrap(), ProductStatus::Hidden);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn display_matches_stored_value() {
        assert_eq!(PaymentStatus::Failed.to_string(), "failed");
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
    }
}
