//! Field constraints as data.

use regex_lite::Regex;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied predicate for [`Constraint::Custom`].
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A single validation rule and the message reported when it fails.
#[derive(Clone)]
pub enum Constraint {
    /// The value must not be empty.
    Required { message: String },
    /// The value must have at least `min` characters.
    MinLength { min: usize, message: String },
    /// The value must be a well-formed email address (see [`is_email`]).
    Email { message: String },
    /// The value must match a regular expression.
    Pattern { regex: Regex, message: String },
    /// The value must satisfy a caller-supplied predicate.
    Custom {
        name: String,
        predicate: Predicate,
        message: String,
    },
}

impl Constraint {
    /// Short, stable name of the rule (used in logs).
    pub fn name(&self) -> &str {
        match self {
            Self::Required { .. } => "required",
            Self::MinLength { .. } => "min_length",
            Self::Email { .. } => "email",
            Self::Pattern { .. } => "pattern",
            Self::Custom { name, .. } => name,
        }
    }

    /// Message surfaced when the rule fails.
    pub fn message(&self) -> &str {
        match self {
            Self::Required { message }
            | Self::MinLength { message, .. }
            | Self::Email { message }
            | Self::Pattern { message, .. }
            | Self::Custom { message, .. } => message,
        }
    }

    /// Returns `true` if `value` satisfies the rule.
    pub fn check(&self, value: &str) -> bool {
        match self {
            Self::Required { .. } => !value.is_empty(),
            Self::MinLength { min, .. } => value.chars().count() >= *min,
            Self::Email { .. } => is_email(value),
            Self::Pattern { regex, .. } => regex.is_match(value),
            Self::Custom { predicate, .. } => predicate(value),
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { message } => f
                .debug_struct("Required")
                .field("message", message)
                .finish(),
            Self::MinLength { min, message } => f
                .debug_struct("MinLength")
                .field("min", min)
                .field("message", message)
                .finish(),
            Self::Email { message } => f.debug_struct("Email").field("message", message).finish(),
            Self::Pattern { regex, message } => f
                .debug_struct("Pattern")
                .field("regex", &regex.as_str())
                .field("message", message)
                .finish(),
            Self::Custom { name, message, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("message", message)
                .finish_non_exhaustive(),
        }
    }
}

/// Checks `local-part "@" domain` where the domain has at least two
/// dot-separated labels.
///
/// - local part: non-empty, atext characters and dots, no leading, trailing
///   or doubled dot
/// - domain labels: non-empty, ASCII alphanumerics and inner hyphens
/// - top-level label: at least two ASCII letters
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    is_local_part(local) && is_domain(domain)
}

fn is_local_part(local: &str) -> bool {
    if local.is_empty() || local.starts_with('.') || local.ends_with('.') || local.contains("..")
    {
        return false;
    }
    local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c))
}

fn is_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let well_formed = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    // Length check above guarantees a last label.
    let tld = labels[labels.len() - 1];
    well_formed && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_email("test@email.com"));
        assert!(is_email("first.last+tag@mail.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "bad-email",
            "@email.com",
            "test@",
            "test@email",
            "test@@email.com",
            "te st@email.com",
            "test@email.c",
            "test@-email.com",
            ".test@email.com",
            "te..st@email.com",
            "test@email..com",
            "",
        ] {
            assert!(!is_email(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn min_length_counts_characters() {
        let c = Constraint::MinLength {
            min: 8,
            message: "minimum length 8".into(),
        };
        assert!(c.check("ääääääää"));
        assert!(!c.check("äääääää"));
    }

    #[test]
    fn custom_debug_hides_predicate() {
        let c = Constraint::Custom {
            name: "has_at".into(),
            predicate: Arc::new(|v| v.contains('@')),
            message: "Email must include @".into(),
        };
        let dbg = format!("{c:?}");
        assert!(dbg.contains("has_at"));
        assert_eq!(c.name(), "has_at");
    }
}
