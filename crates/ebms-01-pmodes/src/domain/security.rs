//! Security settings of a trading partner or pull-request flow.
//!
//! Keys and certificates are referenced by key store alias only; whether an
//! alias resolves is answered by the `CredentialResolver` port.

use serde::{Deserialize, Serialize};
use shared_types::PasswordType;

/// WS-Security header a username token is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsernameTokenTarget {
    Default,
    Ebms,
}

impl std::fmt::Display for UsernameTokenTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsernameTokenTarget::Default => write!(f, "default_username_token"),
            UsernameTokenTarget::Ebms => write!(f, "ebms_username_token"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameTokenConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_type: PasswordType,
}

impl UsernameTokenConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            password_type: PasswordType::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfig {
    #[serde(default)]
    pub keystore_alias: Option<String>,
    /// Password of the private key; only used when this party signs.
    #[serde(default)]
    pub certificate_password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfig {
    #[serde(default)]
    pub keystore_alias: Option<String>,
    /// Password of the private key; only used when this party decrypts.
    #[serde(default)]
    pub certificate_password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub default_username_token: Option<UsernameTokenConfig>,
    #[serde(default)]
    pub ebms_username_token: Option<UsernameTokenConfig>,
    #[serde(default)]
    pub signature: Option<SigningConfig>,
    #[serde(default)]
    pub encryption: Option<EncryptionConfig>,
}

impl SecurityConfig {
    pub fn username_token(&self, target: UsernameTokenTarget) -> Option<&UsernameTokenConfig> {
        match target {
            UsernameTokenTarget::Default => self.default_username_token.as_ref(),
            UsernameTokenTarget::Ebms => self.ebms_username_token.as_ref(),
        }
    }

    /// True if a sender must authenticate itself under this configuration.
    ///
    /// Encryption settings are not an authentication requirement.
    pub fn has_authentication_requirement(&self) -> bool {
        self.default_username_token.is_some()
            || self.ebms_username_token.is_some()
            || self.signature.is_some()
    }
}
