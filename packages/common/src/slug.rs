/// Maximum slug length, matching a conventional `SlugField`.
pub const MAX_SLUG_LENGTH: usize = 50;

/// Why a slug was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugError {
    Empty,
    TooLong,
    InvalidCharacter(char),
}

impl SlugError {
    pub fn message(&self) -> String {
        match self {
            Self::Empty => "Slug must not be empty".into(),
            Self::TooLong => format!("Slug must be at most {MAX_SLUG_LENGTH} characters"),
            Self::InvalidCharacter(c) => format!(
                "Slug may only contain letters, digits, underscores and hyphens (found {c:?})"
            ),
        }
    }
}

/// Validates a URL-safe slug: ASCII letters, digits, `_` and `-`.
pub fn validate_slug(slug: &str) -> Result<&str, SlugError> {
    if slug.is_empty() {
        return Err(SlugError::Empty);
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(SlugError::TooLong);
    }
    if let Some(c) = slug
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(SlugError::InvalidCharacter(c));
    }
    Ok(slug)
}
