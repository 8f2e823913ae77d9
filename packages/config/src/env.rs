// ABOUTME: Environment variable parsing utilities
// ABOUTME: Typed lookups with defaults, validation and warnings for malformed values

use std::str::FromStr;

/// Parse an environment variable and keep it only if `validator` accepts it.
/// Set-but-invalid values are logged and replaced by `default`.
pub fn parse_env_or_default_with_validation<T, F>(var_name: &str, default: T, validator: F) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(T) -> bool,
{
    let Ok(raw_value) = std::env::var(var_name) else {
        return default;
    };

    match raw_value.trim().parse::<T>() {
        Ok(parsed) if validator(parsed) => parsed,
        Ok(_) => {
            tracing::warn!(
                "Environment variable {} has invalid value '{}', using default: {}",
                var_name,
                raw_value,
                default
            );
            default
        }
        Err(_) => {
            tracing::warn!(
                "Environment variable {} has unparseable value '{}', using default: {}",
                var_name,
                raw_value,
                default
            );
            default
        }
    }
}

/// Read a string variable; blank values count as unset
pub fn env_string_or_default(var_name: &str, default: &str) -> String {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Read an optional string variable; blank values count as unset
pub fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
