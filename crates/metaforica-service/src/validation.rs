use thiserror::Error;
use url::Url;

use crate::models::MEDIUM_CATEGORY;
use crate::slug::generate_slug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid Medium URL")]
    InvalidMediumUrl,
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Invalid slug: {0}")]
    InvalidSlug(String),
    #[error("Medium posts must store an http(s) link in seo_description")]
    MediumLinkRequired,
}

/// Checks an import URL and returns it trimmed, as it will be stored.
///
/// The URL has to mention `medium.com` and be an absolute http(s) URL with a
/// host. Custom publication domains are not recognised.
pub fn validate_medium_url(raw: Option<&str>) -> Result<String, ValidationError> {
    let candidate = raw.map(str::trim).unwrap_or_default();

    if candidate.is_empty() || !candidate.contains("medium.com") {
        return Err(ValidationError::InvalidMediumUrl);
    }

    let url = Url::parse(candidate).map_err(|_| ValidationError::InvalidMediumUrl)?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ValidationError::InvalidMediumUrl),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::InvalidMediumUrl);
    }

    Ok(candidate.to_string())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

/// A client supplied slug must already be in canonical form.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() || generate_slug(slug) != slug {
        return Err(ValidationError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Medium link-through posts keep their target URL in `seo_description`.
pub fn validate_medium_link(
    category: &str,
    seo_description: Option<&str>,
) -> Result<(), ValidationError> {
    if category != MEDIUM_CATEGORY {
        return Ok(());
    }

    match seo_description {
        Some(link) if link.starts_with("http") => Ok(()),
        _ => Err(ValidationError::MediumLinkRequired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_medium_profile_url() {
        assert_eq!(
            validate_medium_url(Some("https://medium.com/@x/my-post-abc123")),
            Ok("https://medium.com/@x/my-post-abc123".to_string())
        );
    }

    #[test]
    fn test_accepts_medium_subdomain() {
        assert!(validate_medium_url(Some("https://alexandra.medium.com/hola-123")).is_ok());
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(
            validate_medium_url(Some("  https://medium.com/p/abc  ")),
            Ok("https://medium.com/p/abc".to_string())
        );
    }

    #[test]
    fn test_missing_url_is_invalid() {
        assert_eq!(
            validate_medium_url(None),
            Err(ValidationError::InvalidMediumUrl)
        );
    }

    #[test]
    fn test_empty_url_is_invalid() {
        assert_eq!(
            validate_medium_url(Some("   ")),
            Err(ValidationError::InvalidMediumUrl)
        );
    }

    #[test]
    fn test_non_medium_url_is_invalid() {
        assert_eq!(
            validate_medium_url(Some("https://example.com/post")),
            Err(ValidationError::InvalidMediumUrl)
        );
    }

    #[test]
    fn test_relative_medium_url_is_invalid() {
        assert_eq!(
            validate_medium_url(Some("medium.com/@x/post")),
            Err(ValidationError::InvalidMediumUrl)
        );
    }

    #[test]
    fn test_non_http_scheme_is_invalid() {
        assert_eq!(
            validate_medium_url(Some("ftp://medium.com/@x/post")),
            Err(ValidationError::InvalidMediumUrl)
        );
    }

    #[test]
    fn test_invalid_url_message() {
        assert_eq!(
            ValidationError::InvalidMediumUrl.to_string(),
            "Invalid Medium URL"
        );
    }

    #[test]
    fn test_blank_title_rejected() {
        assert_eq!(validate_title("  "), Err(ValidationError::EmptyTitle));
        assert!(validate_title("Hola").is_ok());
    }

    #[test]
    fn test_slug_must_be_canonical() {
        assert!(validate_slug("mi-primer-post").is_ok());
        assert!(validate_slug("Mi Primer Post").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_medium_category_requires_link() {
        assert!(validate_medium_link(MEDIUM_CATEGORY, Some("https://medium.com/p/1")).is_ok());
        assert_eq!(
            validate_medium_link(MEDIUM_CATEGORY, Some("descripción")),
            Err(ValidationError::MediumLinkRequired)
        );
        assert_eq!(
            validate_medium_link(MEDIUM_CATEGORY, None),
            Err(ValidationError::MediumLinkRequired)
        );
    }

    #[test]
    fn test_other_categories_do_not_need_link() {
        assert!(validate_medium_link("Reflexiones", None).is_ok());
    }
}
