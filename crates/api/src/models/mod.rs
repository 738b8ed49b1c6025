//! Domain models served by the API.
//!
//! These are the response and request shapes. Database row types stay private
//! to the repositories in [`crate::db`] and convert into these.

pub mod address;
pub mod banner;
pub mod bundle;
pub mod catalog;
pub mod customer;
pub mod user;
pub mod wishlist;

/// First field whose value is missing or only whitespace.
pub(crate) fn first_blank(fields: &[(&'static str, Option<&str>)]) -> Option<&'static str> {
    fields
        .iter()
        .find(|(_, value)| value.is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_blank() {
        assert_eq!(first_blank(&[("a", Some("x")), ("b", Some("y"))]), None);
        assert_eq!(first_blank(&[("a", Some("x")), ("b", None)]), Some("b"));
        assert_eq!(first_blank(&[("a", Some(" ")), ("b", None)]), Some("a"));
    }
}
