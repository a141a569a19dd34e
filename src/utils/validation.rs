// file: src/utils/validation.rs
// description: configuration and identifier validation helpers
// reference: git check-ref-format rules, input validation patterns

use crate::error::{PublishError, Result};

pub struct Validator;

impl Validator {
    pub fn validate_required(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(PublishError::Config(format!("{} must not be empty", field)));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PublishError::Config(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Subset of `git check-ref-format` that matters for a branch name in a URL path.
    pub fn validate_branch_name(branch: &str) -> Result<()> {
        let invalid = |why: &str| {
            Err(PublishError::Config(format!(
                "Invalid branch name '{}': {}",
                branch, why
            )))
        };

        if branch.trim().is_empty() {
            return invalid("empty");
        }
        if branch.starts_with('/') || branch.ends_with('/') || branch.contains("//") {
            return invalid("misplaced '/'");
        }
        if branch.contains("..") || branch.contains("@{") {
            return invalid("contains '..' or '@{'");
        }
        if branch.ends_with('.') || branch.ends_with(".lock") || branch.starts_with('-') {
            return invalid("bad leading or trailing characters");
        }
        if branch
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || "~^:?*[\\".contains(c))
        {
            return invalid("contains a forbidden character");
        }
        if branch.split('/').any(|part| part.starts_with('.')) {
            return invalid("a component starts with '.'");
        }

        Ok(())
    }

    /// 40 hex characters, the shape of a SHA-1 git object id.
    pub fn is_object_sha(sha: &str) -> bool {
        sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(Validator::validate_required("token", "abc").is_ok());
        assert!(Validator::validate_required("token", "").is_err());
        assert!(Validator::validate_required("token", "   ").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://api.github.com").is_ok());
        assert!(Validator::validate_url("http://localhost:8080").is_ok());
        assert!(Validator::validate_url("api.github.com").is_err());
    }

    #[test]
    fn test_validate_branch_name() {
        for ok in ["main", "gh-pages", "release/2024.1", "feature/x_y", "fix#12"] {
            assert!(Validator::validate_branch_name(ok).is_ok(), "{}", ok);
        }
        for bad in [
            "", "/main", "main/", "a//b", "a..b", "a.lock", "-x", "has space", "a:b", "x/.hidden",
            "end.",
        ] {
            assert!(Validator::validate_branch_name(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_is_object_sha() {
        assert!(Validator::is_object_sha("0123456789abcdef0123456789abcdef01234567"));
        assert!(!Validator::is_object_sha("0123"));
        assert!(!Validator::is_object_sha("Error: Not Found"));
    }
}
