//! # Core Container
//!
//! Builds the subsystem services from configuration and holds them for the
//! lifetime of the process.
//!
//! ```text
//! CredentialsConfig ─→ StaticCredentialResolver ─→ validator ─┐
//!                                                            ├─→ PModeManager
//! pmodes.store ─────→ PModeSet ───────────────────────────────┤
//!                                                            └─→ PModeMatcher
//! storage.repository → MessageUnitRepository ───────────────────→ MessageUnitManager
//! ```

use crate::container::config::{
    ConfigError, CoreConfig, CredentialsConfig, ACCEPT_ALL_VALIDATOR, BASIC_VALIDATOR, IN_MEMORY,
};
use ebms_01_pmodes::adapters::{
    AcceptAllValidator, BasicPModeValidator, InMemoryPModeSet, StaticCredentialResolver,
};
use ebms_01_pmodes::{CredentialResolver, PModeManager, PModeMatcher, PModeSet, PModeValidator};
use ebms_02_message_units::adapters::InMemoryMessageUnitRepository;
use ebms_02_message_units::{MessageUnitManager, MessageUnitRepository};
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::info;

/// The wired ebMS core.
pub struct Core {
    pub pmode_manager: Arc<PModeManager>,
    pub pmode_matcher: Arc<PModeMatcher>,
    pub message_units: Arc<MessageUnitManager>,
}

impl Core {
    pub fn build(config: &CoreConfig) -> Result<Self, ConfigError> {
        Self::build_with_time_source(config, Arc::new(SystemTimeSource))
    }

    pub fn build_with_time_source(
        config: &CoreConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let store = create_pmode_store(&config.pmodes.store, Arc::clone(&time_source))?;
        let credentials = create_credential_resolver(&config.credentials);
        let validator = create_pmode_validator(&config.pmodes.validator, credentials)?;
        let repository = create_repository(&config.storage.repository)?;

        info!(
            pmode_store = %config.pmodes.store,
            pmode_validator = %config.pmodes.validator,
            repository = %config.storage.repository,
            host_id = %config.host_id.0,
            "Wiring ebMS core"
        );

        Ok(Self {
            pmode_manager: Arc::new(PModeManager::new(Arc::clone(&store), validator)),
            pmode_matcher: Arc::new(PModeMatcher::new(store)),
            message_units: Arc::new(MessageUnitManager::new(
                repository,
                time_source,
                config.host_id.0.clone(),
            )),
        })
    }
}

pub fn create_pmode_store(
    name: &str,
    time_source: Arc<dyn TimeSource>,
) -> Result<Arc<dyn PModeSet>, ConfigError> {
    match name {
        IN_MEMORY => Ok(Arc::new(InMemoryPModeSet::with_time_source(time_source))),
        other => Err(ConfigError::UnknownImplementation {
            component: "P-Mode store",
            name: other.to_string(),
        }),
    }
}

pub fn create_pmode_validator(
    name: &str,
    credentials: Arc<dyn CredentialResolver>,
) -> Result<Arc<dyn PModeValidator>, ConfigError> {
    match name {
        BASIC_VALIDATOR => Ok(Arc::new(BasicPModeValidator::new(credentials))),
        ACCEPT_ALL_VALIDATOR => Ok(Arc::new(AcceptAllValidator)),
        other => Err(ConfigError::UnknownImplementation {
            component: "P-Mode validator",
            name: other.to_string(),
        }),
    }
}

pub fn create_repository(name: &str) -> Result<Arc<dyn MessageUnitRepository>, ConfigError> {
    match name {
        IN_MEMORY => Ok(Arc::new(InMemoryMessageUnitRepository::new())),
        other => Err(ConfigError::UnknownImplementation {
            component: "message unit repository",
            name: other.to_string(),
        }),
    }
}

pub fn create_credential_resolver(config: &CredentialsConfig) -> Arc<dyn CredentialResolver> {
    let resolver = config
        .private_keys
        .iter()
        .fold(StaticCredentialResolver::new(), |r, (alias, password)| {
            r.with_private_key(alias.clone(), password.clone())
        });
    let resolver = config
        .certificates
        .iter()
        .fold(resolver, |r, alias| r.with_certificate(alias.clone()));
    Arc::new(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebms_01_pmodes::CertificateUsage;

    #[test]
    fn test_factories_reject_unknown_names() {
        let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        assert!(create_pmode_store("in-memory", clock.clone()).is_ok());
        assert!(create_pmode_store("ldap", clock).is_err());
        assert!(create_repository("sqlite").is_err());

        let credentials = create_credential_resolver(&CredentialsConfig::default());
        assert!(create_pmode_validator("accept-all", credentials.clone()).is_ok());
        assert!(matches!(
            create_pmode_validator("strict", credentials),
            Err(ConfigError::UnknownImplementation { .. })
        ));
    }

    #[test]
    fn test_credentials_from_config() {
        let mut config = CredentialsConfig::default();
        config.private_keys.insert("ours".into(), "secret".into());
        config.certificates.push("partner".into());

        let resolver = create_credential_resolver(&config);
        assert!(resolver.has_private_key("ours", "secret"));
        assert!(resolver.has_certificate("partner", CertificateUsage::Encryption));
        assert!(!resolver.has_certificate("ours", CertificateUsage::Signing));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = CoreConfig::default();
        config.pmodes.validator = "strict".into();
        assert!(Core::build(&config).is_err());
        assert!(Core::build(&CoreConfig::default()).is_ok());
    }
}
