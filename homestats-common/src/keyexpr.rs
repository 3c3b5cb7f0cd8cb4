use crate::error::{Error, Result};

/// Builder for HomeStats key expressions.
///
/// Payloads are published on `<prefix>/<host>/sensors`.
#[derive(Debug, Clone)]
pub struct KeyExprBuilder {
    prefix: String,
}

impl KeyExprBuilder {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key a host's sensor payloads are published on.
    ///
    /// # Example
    /// ```
    /// use homestats_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::with_prefix("homestats/aida64");
    /// assert_eq!(builder.sensors_key("desk-pc"), "homestats/aida64/desk-pc/sensors");
    /// ```
    pub fn sensors_key(&self, host: &str) -> String {
        format!("{}/{}/sensors", self.prefix, sanitize_segment(host))
    }
}

/// Replace characters that are not allowed inside a single key segment.
pub fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            '/' | '*' | '$' | '?' | '#' | ' ' => '_',
            c => c,
        })
        .collect()
}

/// Check that a configured prefix can be used as a literal key expression.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(Error::KeyExpr("prefix is empty".to_string()));
    }

    if prefix.starts_with('/') || prefix.ends_with('/') {
        return Err(Error::KeyExpr(format!(
            "'{}' must not start or end with '/'",
            prefix
        )));
    }

    if let Some(c) = prefix.chars().find(|c| matches!(c, '*' | '$' | '?' | '#')) {
        return Err(Error::KeyExpr(format!(
            "'{}' contains reserved character '{}'",
            prefix, c
        )));
    }

    if prefix.split('/').any(str::is_empty) {
        return Err(Error::KeyExpr(format!("'{}' has an empty segment", prefix)));
    }

    Ok(())
}
