//! Heuristic identity extraction (name, email, phone).
//!
//! Layout-dependent and unreliable: the "name" is simply the first non-empty line.
//! Results are labelled best-effort and never feed into scoring.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Identity;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s\-()]{8,}\d").unwrap());

pub fn extract_identity(text: &str) -> Identity {
    let name = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from);

    let email = EMAIL_RE.find(text).map(|m| m.as_str().to_string());
    let mobile = PHONE_RE.find(text).map(|m| m.as_str().trim().to_string());

    Identity {
        name,
        email,
        mobile,
    }
}
