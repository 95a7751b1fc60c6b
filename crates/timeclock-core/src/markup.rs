//! Scraping of the HR service's sign-in pages
//!
//! The service has no token API for sign-in, so the anti-forgery token and
//! the failure banner are pulled out of HTML. Everything that depends on the
//! page markup lives here.

use regex::Regex;
use std::sync::LazyLock;

static CSRF_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="csrf-token"\s+content="([^"]+)""#).unwrap()
});

static ERROR_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div class="flash flash--wrong">([^<]+)</div>"#).unwrap()
});

/// Anti-forgery token embedded in the sign-in page
pub fn extract_token(html: &str) -> Option<String> {
    CSRF_TOKEN
        .captures(html)
        .map(|caps| caps[1].to_string())
}

/// Message of the inline error banner shown after a rejected sign-in
pub fn extract_error(html: &str) -> Option<String> {
    ERROR_BANNER
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|msg| !msg.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGN_IN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta name="csrf-param" content="authenticity_token" />
  <meta name="csrf-token" content="abc123+/==" />
</head>
<body><form action="/users/sign_in" method="post"></form></body>
</html>"#;

    #[test]
    fn token_is_extracted() {
        assert_eq!(extract_token(SIGN_IN_PAGE).as_deref(), Some("abc123+/=="));
    }

    #[test]
    fn missing_token() {
        assert_eq!(extract_token("<html><head></head></html>"), None);
        assert_eq!(extract_token(r#"<meta name="csrf-token" content="">"#), None);
    }

    #[test]
    fn error_banner_is_trimmed() {
        let html = r#"<div class="flash flash--wrong">
            Invalid email or password.
        </div>"#;
        assert_eq!(extract_error(html).as_deref(), Some("Invalid email or password."));
    }

    #[test]
    fn no_banner_on_success_page() {
        assert_eq!(extract_error(SIGN_IN_PAGE), None);
        assert_eq!(extract_error(r#"<div class="flash flash--ok">Welcome</div>"#), None);
    }
}
