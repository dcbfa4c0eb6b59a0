//! Service container - registration and lookup of every wrapper.
//!
//! Services are registered once through [`ServicesBuilder`] and handed out
//! as shared `Arc`s. Asking for a service that was never registered is an
//! `AppError::NotRegistered` naming it.

use std::sync::Arc;

use caching::{CacheClient, CacheEntryOptions, CacheStore, MemoryStore, RedisStore};
use common::{
    AppError, AppResult, CacheConfig, CipherConfig, DatabaseConfig, DocumentConfig,
    HashingConfig, Settings, SmsConfig, SmtpConfig, StorageConfig,
};
use communication::{email_sender, EmailSender, SmsSender, TwilioSender};
use documents::DocumentStore;
use persistence::Persistence;
use security::{AesGcmCipher, Argon2Hasher, Cipher, Hasher};
use storage::S3Client;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn hasher(&self) -> AppResult<Arc<dyn Hasher>>;

    fn cipher(&self) -> AppResult<Arc<dyn Cipher>>;

    fn cache(&self) -> AppResult<Arc<CacheClient>>;

    fn storage(&self) -> AppResult<Arc<S3Client>>;

    fn email(&self) -> AppResult<Arc<dyn EmailSender>>;

    fn sms(&self) -> AppResult<Arc<dyn SmsSender>>;

    fn persistence(&self) -> AppResult<Arc<Persistence>>;

    fn documents(&self) -> AppResult<Arc<DocumentStore>>;
}

fn registered<T: ?Sized>(service: &Option<Arc<T>>, name: &'static str) -> AppResult<Arc<T>> {
    service.clone().ok_or(AppError::NotRegistered(name))
}

/// Concrete implementation of ServiceContainer
#[derive(Clone, Default)]
pub struct Services {
    hasher: Option<Arc<dyn Hasher>>,
    cipher: Option<Arc<dyn Cipher>>,
    cache: Option<Arc<CacheClient>>,
    storage: Option<Arc<S3Client>>,
    email: Option<Arc<dyn EmailSender>>,
    sms: Option<Arc<dyn SmsSender>>,
    persistence: Option<Arc<Persistence>>,
    documents: Option<Arc<DocumentStore>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("hasher", &self.hasher.is_some())
            .field("cipher", &self.cipher.is_some())
            .field("cache", &self.cache.is_some())
            .field("storage", &self.storage.is_some())
            .field("email", &self.email.is_some())
            .field("sms", &self.sms.is_some())
            .field("persistence", &self.persistence.is_some())
            .field("documents", &self.documents.is_some())
            .finish()
    }
}

impl Services {
    pub fn builder() -> ServicesBuilder {
        ServicesBuilder::new()
    }
}

impl ServiceContainer for Services {
    fn hasher(&self) -> AppResult<Arc<dyn Hasher>> {
        registered(&self.hasher, "hasher")
    }

    fn cipher(&self) -> AppResult<Arc<dyn Cipher>> {
        registered(&self.cipher, "cipher")
    }

    fn cache(&self) -> AppResult<Arc<CacheClient>> {
        registered(&self.cache, "cache")
    }

    fn storage(&self) -> AppResult<Arc<S3Client>> {
        registered(&self.storage, "storage")
    }

    fn email(&self) -> AppResult<Arc<dyn EmailSender>> {
        registered(&self.email, "email")
    }

    fn sms(&self) -> AppResult<Arc<dyn SmsSender>> {
        registered(&self.sms, "sms")
    }

    fn persistence(&self) -> AppResult<Arc<Persistence>> {
        registered(&self.persistence, "persistence")
    }

    fn documents(&self) -> AppResult<Arc<DocumentStore>> {
        registered(&self.documents, "documents")
    }
}

/// Registers services into a [`Services`] container.
///
/// `add_*` builds a service from its configuration, `*_with` registers a
/// ready instance. Registering the same service twice keeps the last one.
#[derive(Default)]
pub struct ServicesBuilder {
    services: Services,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hasher(self, config: &HashingConfig) -> AppResult<Self> {
        Ok(self.hasher_with(Arc::new(Argon2Hasher::from_config(config)?)))
    }

    pub fn hasher_with(mut self, hasher: Arc<dyn Hasher>) -> Self {
        self.services.hasher = Some(hasher);
        self
    }

    pub fn add_cipher(self, config: &CipherConfig) -> AppResult<Self> {
        Ok(self.cipher_with(Arc::new(AesGcmCipher::from_config(config)?)))
    }

    pub fn cipher_with(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.services.cipher = Some(cipher);
        self
    }

    pub fn add_memory_cache(self, config: &CacheConfig) -> AppResult<Self> {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new(config.memory_capacity));
        let defaults = CacheEntryOptions::from_config(config)?;
        Ok(self.cache_with(CacheClient::new(store).with_defaults(defaults)))
    }

    pub async fn add_redis_cache(self, config: &CacheConfig) -> AppResult<Self> {
        let store: Arc<dyn CacheStore> = Arc::new(RedisStore::connect(config).await?);
        let defaults = CacheEntryOptions::from_config(config)?;
        Ok(self.cache_with(CacheClient::new(store).with_defaults(defaults)))
    }

    pub fn cache_with(mut self, cache: CacheClient) -> Self {
        self.services.cache = Some(Arc::new(cache));
        self
    }

    pub fn add_storage(self, config: &StorageConfig) -> AppResult<Self> {
        Ok(self.storage_with(S3Client::from_config(config)?))
    }

    pub fn storage_with(mut self, client: S3Client) -> Self {
        self.services.storage = Some(Arc::new(client));
        self
    }

    /// SMTP when a host is configured, a logging sender otherwise.
    pub fn add_email(self, config: &SmtpConfig) -> AppResult<Self> {
        Ok(self.email_with(email_sender(config)?))
    }

    pub fn email_with(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.services.email = Some(sender);
        self
    }

    pub fn add_sms(self, config: &SmsConfig) -> AppResult<Self> {
        Ok(self.sms_with(Arc::new(TwilioSender::from_config(config)?)))
    }

    pub fn sms_with(mut self, sender: Arc<dyn SmsSender>) -> Self {
        self.services.sms = Some(sender);
        self
    }

    pub async fn add_persistence(self, config: &DatabaseConfig) -> AppResult<Self> {
        Ok(self.persistence_with(Persistence::connect(config).await?))
    }

    pub fn persistence_with(mut self, persistence: Persistence) -> Self {
        self.services.persistence = Some(Arc::new(persistence));
        self
    }

    pub async fn add_documents(self, config: &DocumentConfig) -> AppResult<Self> {
        Ok(self.documents_with(DocumentStore::connect(config).await?))
    }

    pub fn documents_with(mut self, store: DocumentStore) -> Self {
        self.services.documents = Some(Arc::new(store));
        self
    }

    /// Register every service whose configuration is present.
    ///
    /// Hashing, caching and email always register; the cache falls back to
    /// the in-memory store and email to the logging sender.
    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        let mut builder = Self::new().add_hasher(&settings.hashing)?.add_email(&settings.smtp)?;

        builder = match settings.cache.url {
            Some(_) => builder.add_redis_cache(&settings.cache).await?,
            None => builder.add_memory_cache(&settings.cache)?,
        };
        if settings.cipher.is_configured() {
            builder = builder.add_cipher(&settings.cipher)?;
        }
        if settings.storage.is_configured() {
            builder = builder.add_storage(&settings.storage)?;
        }
        if settings.sms.is_configured() {
            builder = builder.add_sms(&settings.sms)?;
        }
        if let Some(database) = &settings.database {
            builder = builder.add_persistence(database).await?;
        }
        if let Some(documents) = &settings.documents {
            builder = builder.add_documents(documents).await?;
        }

        tracing::debug!("Services registered from settings");
        Ok(builder)
    }

    pub fn build(self) -> Services {
        self.services
    }
}

#[cfg(test)]
mod tests {
    use security::MockHasher;

    use super::*;

    #[test]
    fn test_unregistered_service_is_named() {
        let services = Services::default();
        match services.cipher() {
            Err(AppError::NotRegistered(name)) => assert_eq!(name, "cipher"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(services.persistence().err().map(|e| e.code()), Some("NOT_REGISTERED"));
    }

    #[test]
    fn test_with_registers_instance() {
        let mut hasher = MockHasher::new();
        hasher.expect_hash().returning(|_| Ok("hashed".to_string()));

        let services = ServicesBuilder::new().hasher_with(Arc::new(hasher)).build();
        assert_eq!(services.hasher().unwrap().hash("pw").unwrap(), "hashed");
    }

    #[test]
    fn test_cipher_requires_passphrase() {
        let err = ServicesBuilder::new()
            .add_cipher(&CipherConfig::default())
            .err()
            .unwrap();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_from_settings_registers_defaults() {
        let services = ServicesBuilder::from_settings(&Settings::default())
            .await
            .unwrap()
            .build();

        assert!(services.hasher().is_ok());
        assert!(services.email().is_ok());
        assert!(services.cache().is_ok());
        assert!(services.cipher().is_err());
        assert!(services.storage().is_err());
        assert!(services.sms().is_err());
        assert!(services.persistence().is_err());
        assert!(services.documents().is_err());
    }

    #[tokio::test]
    async fn test_from_settings_registers_configured_cipher() {
        let mut settings = Settings::default();
        settings.cipher.passphrase = Some("correct horse battery staple".to_string());

        let services = ServicesBuilder::from_settings(&settings).await.unwrap().build();
        let cipher = services.cipher().unwrap();
        let sealed = cipher.encrypt("secret").unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "secret");
    }
}
