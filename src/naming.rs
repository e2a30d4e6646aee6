//! Shape checks for names that come from configuration: tier names, accessor
//! names, attribute names and persona type names.

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern compiles")
});

// `User`, `Admin::User`
static TYPE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Za-z0-9_]*(::[A-Z][A-Za-z0-9_]*)*$").expect("type path pattern compiles")
});

pub(crate) fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

pub(crate) fn is_type_path(name: &str) -> bool {
    TYPE_PATH.is_match(name)
}

/// Snake-case singular key for a persona type name: `AdminUser` becomes
/// `admin_user`, `Staff::Member` becomes `staff_member`.
pub(crate) fn singular_route_key(type_path: &str) -> String {
    let mut key = String::with_capacity(type_path.len() + 4);
    for segment in type_path.split("::") {
        if !key.is_empty() {
            key.push('_');
        }
        let chars: Vec<char> = segment.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            if c.is_ascii_uppercase() {
                let prev_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
                let acronym_end = i > 0
                    && chars[i - 1].is_ascii_uppercase()
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                if prev_lower || acronym_end {
                    key.push('_');
                }
                key.push(c.to_ascii_lowercase());
            } else {
                key.push(c);
            }
        }
    }
    key
}
