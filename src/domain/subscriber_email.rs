//! src/domain/subscriber_email.rs

/// An email address after trimming and lower-casing, which has passed the
/// structural check: one `@`, a non-empty local part and a dotted domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: String) -> Result<SubscriberEmail, String> {
        let normalized = normalize(&s);
        if normalized.is_empty() {
            return Err("Email not provided".into());
        }
        if is_structurally_valid(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(format!("{} is not a valid subscriber email.", normalized))
        }
    }
}

pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn is_structurally_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // at least one dot with something on both sides of it
    domain
        .split_once('.')
        .map(|(head, tail)| !head.is_empty() && !tail.is_empty())
        .unwrap_or(false)
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
