//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize the
//! rules every boundary operation applies before touching storage.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Trim a required text field, rejecting empty values.
pub(crate) fn required(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Usernames are stored and compared lowercased.
pub(crate) fn normalize_username(value: &str) -> ResultEngine<String> {
    Ok(required(value, "username")?.to_lowercase())
}

pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = required(value, "email")?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(EngineError::Validation(format!("invalid email: {email}"))),
    }
}

/// Collapse inner whitespace of a category label, keeping its casing.
pub(crate) fn normalize_category_display(value: &str) -> ResultEngine<String> {
    let label = required(value, "category")?;
    Ok(label.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Matching key for category labels.
///
/// Two labels refer to the same card iff their keys are equal: the
/// comparison ignores case, accents and runs of whitespace.
pub(crate) fn normalize_category_key(value: &str) -> ResultEngine<String> {
    let display = normalize_category_display(value)?;
    let mut out = String::with_capacity(display.len());
    for ch in display.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        out.extend(ch.to_lowercase());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_key_ignores_case_accents_and_spacing() {
        assert_eq!(
            normalize_category_key("  Food   &  Drink ").unwrap(),
            normalize_category_key("food & drink").unwrap()
        );
        assert_eq!(normalize_category_key("Café").unwrap(), "cafe");
        assert_ne!(
            normalize_category_key("Shopping").unwrap(),
            normalize_category_key("Shop").unwrap()
        );
    }

    #[test]
    fn category_display_keeps_casing() {
        assert_eq!(
            normalize_category_display(" Housing  & Utilities").unwrap(),
            "Housing & Utilities"
        );
        assert!(normalize_category_display("   ").is_err());
    }

    #[test]
    fn username_is_lowercased() {
        assert_eq!(normalize_username(" Alice ").unwrap(), "alice");
        assert!(normalize_username("").is_err());
    }

    #[test]
    fn email_requires_an_at_sign() {
        assert_eq!(normalize_email(" a@x.com ").unwrap(), "a@x.com");
        assert!(normalize_email("ax.com").is_err());
        assert!(normalize_email("@x.com").is_err());
    }
}
