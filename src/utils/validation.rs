use crate::utils::error::{HarnessError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(HarnessError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 副檔名清單驗證：不含點、不含路徑分隔字元，例如 ["pdf", "ps"]
pub fn validate_extension_list(field_name: &str, extensions: &[String]) -> Result<()> {
    if extensions.is_empty() {
        return Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: String::new(),
            reason: "At least one file extension is required".to_string(),
        });
    }

    for ext in extensions {
        if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(HarnessError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: ext.clone(),
                reason: "Extensions must be bare suffixes like 'pdf'".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HarnessError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("webhook.endpoint", "https://example.com/hook").is_ok());
        assert!(validate_url("webhook.endpoint", "http://example.com").is_ok());
        assert!(validate_url("webhook.endpoint", "").is_err());
        assert!(validate_url("webhook.endpoint", "invalid-url").is_err());
        assert!(validate_url("webhook.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("readiness.max_attempts", 5, 1).is_ok());
        assert!(validate_positive_number("readiness.max_attempts", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("readiness.poll_interval_ms", 500u64, 10, 600_000).is_ok());
        assert!(validate_range("readiness.poll_interval_ms", 5u64, 10, 600_000).is_err());
        assert!(validate_range("readiness.poll_interval_ms", 700_000u64, 10, 600_000).is_err());
    }

    #[test]
    fn test_validate_extension_list() {
        let exts = vec!["pdf".to_string(), "ps".to_string()];
        assert!(validate_extension_list("watch.extensions", &exts).is_ok());

        assert!(validate_extension_list("watch.extensions", &[]).is_err());
        assert!(validate_extension_list("watch.extensions", &[".pdf".to_string()]).is_err());
        assert!(validate_extension_list("watch.extensions", &["a/b".to_string()]).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("watch.directory", "/var/spool/pdf").is_ok());
        assert!(validate_path("watch.directory", "").is_err());
        assert!(validate_path("watch.directory", "bad\0path").is_err());
    }
}
