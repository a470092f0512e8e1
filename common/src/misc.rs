use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Res};

/// Role stored on a profile. A profile may also carry an empty type until the owner picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Customer,
    Business,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::Business => "business",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(UserType::Customer),
            "business" => Some(UserType::Business),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pricing tier of an offer. Every offer carries exactly one detail per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    Basic,
    Standard,
    Premium,
}

impl OfferType {
    pub const ALL: [OfferType; 3] = [OfferType::Basic, OfferType::Standard, OfferType::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::Basic => "basic",
            OfferType::Standard => "standard",
            OfferType::Premium => "premium",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(OfferType::Basic),
            "standard" => Some(OfferType::Standard),
            "premium" => Some(OfferType::Premium),
            _ => None,
        }
    }
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(OrderStatus::InProgress),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Only an order in progress can move, and only to a terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::InProgress, OrderStatus::Completed)
                | (OrderStatus::InProgress, OrderStatus::Cancelled)
        )
    }

    pub fn transition_to(&self, next: OrderStatus) -> Res<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::field(
                "status",
                format!(
                    "Cannot change status from '{}' to '{}'.",
                    self.as_str(),
                    next.as_str()
                ),
            ))
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_only_leaves_in_progress() {
        use OrderStatus::*;
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));

        for (from, to) in [
            (InProgress, InProgress),
            (Completed, InProgress),
            (Completed, Cancelled),
            (Completed, Completed),
            (Cancelled, InProgress),
            (Cancelled, Completed),
            (Cancelled, Cancelled),
        ] {
            assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            assert!(matches!(
                from.transition_to(to),
                Err(AppError::Validation(ref e)) if e.contains("status")
            ));
        }
    }

    #[test]
    fn parses_enums_from_wire_values() {
        assert_eq!(OrderStatus::from_str("in_progress"), Some(OrderStatus::InProgress));
        assert_eq!(OrderStatus::from_str("done"), None);
        assert_eq!(OfferType::from_str("premium"), Some(OfferType::Premium));
        assert_eq!(OfferType::from_str("gold"), None);
        assert_eq!(UserType::from_str("business"), Some(UserType::Business));
        assert_eq!(UserType::from_str(""), None);
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn validates_email_shape() {
        assert!(is_valid_email("owner@mail.de"));
        assert!(is_valid_email("first.last+tag@sub.example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@mail.de"));
        assert!(!is_valid_email("a@b@c.de"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("us er@mail.de"));
    }
}
