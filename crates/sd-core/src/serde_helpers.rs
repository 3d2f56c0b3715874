//! Shared serde helper functions used by the snapshot and config formats.

/// Serde default function that returns `true`.
///
/// Used for flags such as column nullability that are on unless stated.
pub fn default_true() -> bool {
    true
}
