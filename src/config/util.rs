//! Utility functions for serde serialization.
//!
//! Helpers used with serde's `skip_serializing_if` attribute by the canonical
//! node model and the per-target record types.

/// Returns `true` if the boolean value is `false`.
///
/// Used with `#[serde(skip_serializing_if = "is_false")]` to omit false values.
#[inline]
pub fn is_false(b: &bool) -> bool {
    !*b
}

/// Returns `true` if the u32 value is zero.
#[inline]
pub fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// Returns `true` if the string is empty.
///
/// Used for optional-in-practice string fields that the target omits when blank.
#[inline]
pub fn is_empty_str(s: &str) -> bool {
    s.is_empty()
}
