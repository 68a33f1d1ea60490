//! Value object trait: equality by value, not identity.
//!
//! Actions and carrier options are value objects: they carry no identity of their own
//! and two instances with the same fields are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one, build a
/// new one with the new values.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct CarrierOption { name: String, cost: u32 }
///
/// impl ValueObject for CarrierOption {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
