//! Server-assigned identifiers.
//!
//! Every id the goods mall hands out is an integer, and a cart id passed
//! where a goods id belongs would silently hit the wrong endpoint. Each
//! kind gets its own wrapper so the compiler catches the mix-up.

/// Declares an `i64`-backed id wrapper.
///
/// The generated type is `Copy`, ordered, hashable, and (de)serializes as
/// the bare number. It parses from text with surrounding whitespace
/// ignored and converts to and from `i64`.
///
/// ```rust
/// # use goodsmall_core::define_id;
/// define_id!(CouponId);
///
/// let coupon: CouponId = " 12 ".parse().unwrap();
/// assert_eq!(coupon.as_i64(), 12);
/// assert_eq!(i64::from(CouponId::new(3)), 3);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(GoodsId);
define_id!(CartId);
define_id!(OrderId);
define_id!(SellerId);
define_id!(CategoryId);

impl CategoryId {
    /// The synthetic "all products" category the client shows first.
    pub const ALL: Self = Self::new(0);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = GoodsId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: CartId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, CartId::new(7));
    }

    #[test]
    fn test_id_from_str_trims() {
        assert_eq!(" 15 ".parse::<OrderId>().unwrap(), OrderId::new(15));
        assert!("abc".parse::<OrderId>().is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(SellerId::new(3).to_string(), "3");
        assert_eq!(CategoryId::ALL.as_i64(), 0);
    }
}
