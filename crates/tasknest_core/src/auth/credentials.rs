//! Client-side credential pre-checks run before contacting the provider.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Loose shape check: one `@`, a dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Returns a user-facing message when the form must not be submitted.
pub fn check_credentials(email: &str, password: &str) -> Result<(), &'static str> {
    if email.trim().is_empty() {
        return Err("Email is required.");
    }
    if !is_valid_email(email) {
        return Err("Enter a valid email address.");
    }
    if password.is_empty() {
        return Err("Password is required.");
    }
    Ok(())
}
