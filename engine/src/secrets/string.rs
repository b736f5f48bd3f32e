use std::fmt;

/// Provider API key resolved from a model endpoint's configuration
///
/// Providers hold their key in this type so that formatting it, as a tracing
/// field or with `{:?}`, never reveals it. The raw value is only read when the
/// auth header is built, through [`SecretString::unsecure`].
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key, for request headers only
    pub fn unsecure(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}
