//! Newtype IDs for type-safe entity references.
//!
//! Every table uses an `INTEGER GENERATED ALWAYS AS IDENTITY` primary key, so
//! each ID wraps an `i32`. IDs deserialize transparently, which lets handlers
//! extract them straight from the path (`Path(id): Path<ProductId>`).

/// Define a type-safe ID wrapper around `i32`.
///
/// The generated type is `Copy`, orderable, hashable, serializes as a bare
/// number, and (with the `postgres` feature) binds and decodes as `INTEGER`.
///
/// # Example
///
/// ```rust
/// # use babycash_core::define_id;
/// define_id!(WishlistId);
///
/// let id = WishlistId::new(7);
/// assert_eq!(id.as_i32(), 7);
/// assert_eq!(id.to_string(), "7");
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
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw database ID.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Accounts
define_id!(UserId);
define_id!(RefreshTokenId);
define_id!(AuditLogId);

// Catalog & checkout
define_id!(ProductId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(PaymentId);
define_id!(LoyaltyPointId);

// Content
define_id!(BlogPostId);
define_id!(BlogCommentId);
define_id!(TestimonialId);
define_id!(ContactMessageId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&ProductId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: OrderId = serde_json::from_str("17").unwrap();
        assert_eq!(id, OrderId::new(17));
    }

    #[test]
    fn test_id_conversions() {
        let id = UserId::from(5);
        assert_eq!(i32::from(id), 5);
        assert_eq!(id.as_i32(), 5);
        assert_eq!(format!("{id}"), "5");
    }

    #[test]
    fn test_ids_order_by_value() {
        let mut ids = vec![CartItemId::new(3), CartItemId::new(1), CartItemId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![CartItemId::new(1), CartItemId::new(2), CartItemId::new(3)]);
    }
}
