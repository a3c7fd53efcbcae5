//! Namespace and ref name validation.
//!
//! Namespaces become a single key segment, so they may not contain `/`.
//! Ref names may be hierarchical (`stacks/app1`) but every component must be
//! non-empty and must not be `.` or `..`. Neither may contain NUL or other
//! control characters.

use crate::error::{CoreError, Result};

fn invalid(name: &str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn check_chars(name: &str) -> Result<()> {
    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(invalid(name, format!("contains control character {ch:?}")));
    }
    Ok(())
}

/// Validate a namespace.
///
/// ```
/// use thrap_core::validate_namespace;
///
/// assert!(validate_namespace("stacks").is_ok());
/// assert!(validate_namespace("").is_err());
/// assert!(validate_namespace("a/b").is_err());
/// ```
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(invalid(namespace, "namespace must not be empty"));
    }
    if namespace.contains('/') {
        return Err(invalid(namespace, "namespace must not contain '/'"));
    }
    check_chars(namespace)
}

/// Validate a ref name.
///
/// ```
/// use thrap_core::validate_ref_name;
///
/// assert!(validate_ref_name("app1").is_ok());
/// assert!(validate_ref_name("team/app1").is_ok());
/// assert!(validate_ref_name("team//app1").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "ref name must not be empty"));
    }
    check_chars(name)?;
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    for component in name.split('/') {
        match component {
            "" => return Err(invalid(name, "must not contain '//'")),
            "." | ".." => return Err(invalid(name, "must not contain '.' or '..' components")),
            _ => {}
        }
    }
    Ok(())
}
