//! Credential resolver backed by a fixed set of aliases.
//!
//! Stands in for a key store when wiring the core or in tests.

use crate::ports::outbound::{CertificateUsage, CredentialResolver};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct StaticCredentialResolver {
    /// alias -> password of the private key
    private_keys: HashMap<String, String>,
    certificates: HashSet<(String, CertificateUsage)>,
}

impl StaticCredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_private_key(mut self, alias: impl Into<String>, password: impl Into<String>) -> Self {
        self.private_keys.insert(alias.into(), password.into());
        self
    }

    /// Registers a certificate usable for both signing and encryption.
    pub fn with_certificate(self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.with_certificate_for(alias.clone(), CertificateUsage::Signing)
            .with_certificate_for(alias, CertificateUsage::Encryption)
    }

    pub fn with_certificate_for(mut self, alias: impl Into<String>, usage: CertificateUsage) -> Self {
        self.certificates.insert((alias.into(), usage));
        self
    }
}

impl CredentialResolver for StaticCredentialResolver {
    fn has_private_key(&self, alias: &str, password: &str) -> bool {
        self.private_keys
            .get(alias)
            .is_some_and(|stored| stored == password)
    }

    fn has_certificate(&self, alias: &str, usage: CertificateUsage) -> bool {
        self.certificates.contains(&(alias.to_string(), usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_needs_matching_password() {
        let resolver = StaticCredentialResolver::new().with_private_key("ours", "secret");
        assert!(resolver.has_private_key("ours", "secret"));
        assert!(!resolver.has_private_key("ours", "guess"));
        assert!(!resolver.has_private_key("theirs", "secret"));
    }

    #[test]
    fn test_certificate_usage() {
        let resolver = StaticCredentialResolver::new()
            .with_certificate("both")
            .with_certificate_for("sign-only", CertificateUsage::Signing);
        assert!(resolver.has_certificate("both", CertificateUsage::Encryption));
        assert!(resolver.has_certificate("sign-only", CertificateUsage::Signing));
        assert!(!resolver.has_certificate("sign-only", CertificateUsage::Encryption));
    }
}
