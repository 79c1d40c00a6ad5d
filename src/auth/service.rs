//! Registration and the two login flows.
//!
//! Every self-registration provisions a fresh tenant together with the account in
//! one store transaction. The tenant slug comes from the registrant's name;
//! collisions are retried with numeric suffixes. Password login answers with the
//! same [`Error::InvalidCredential`] whether the email is unknown or the password
//! is wrong, and spends a hash verification in both cases.

use crate::{
    auth::{
        config::AuthConfig,
        google::IdentityVerifier,
        password::CredentialHasher,
        role::Role,
        slug::{self, slugify},
        token::TokenService,
    },
    error::Error,
    models::{Account, Tenant},
    store::{AccountStore, StoreError},
};
use regex::Regex;
use std::sync::{Arc, LazyLock, OnceLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;
const SLUG_ATTEMPTS: usize = 5;
const DUMMY_PASSWORD: &str = "timing-equalizer-password";

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

#[must_use]
pub fn valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}

/// Trimmed and lowercased; every lookup and insert goes through this.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub location_id: Option<Uuid>,
}

#[derive(Clone, Debug)]
pub struct LoginResult {
    pub token: String,
    pub account: Account,
}

pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
    verifier: Arc<dyn IdentityVerifier>,
    google_client_id: String,
    dummy_hash: OnceLock<String>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        tokens: Arc<TokenService>,
        verifier: Arc<dyn IdentityVerifier>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            accounts,
            hasher: CredentialHasher::default(),
            tokens,
            verifier,
            google_client_id: config.google_client_id().to_string(),
            dummy_hash: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    #[must_use]
    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    /// Register an account with `role` inside a freshly provisioned tenant.
    ///
    /// # Errors
    /// `Validation` for bad input, `DuplicateEmail` when the email is taken,
    /// `Conflict` when no free tenant slug is found.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn register(&self, input: Registration, role: Role) -> Result<Account, Error> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }

        let email = normalize_email(&input.email);
        if !valid_email(&email) {
            return Err(Error::Validation("email is invalid".to_string()));
        }

        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        match self.accounts.find_by_email(&email).await {
            Ok(_) => {
                debug!("Registration rejected, email already exists");
                return Err(Error::DuplicateEmail);
            }
            Err(StoreError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let hash = self.hasher.hash(&input.password)?;

        let account = self
            .provision(name, |tenant_id| {
                Account::claimed(
                    name.to_string(),
                    email.clone(),
                    Some(hash.clone()),
                    role,
                    tenant_id,
                    input.location_id,
                )
            })
            .await?;

        info!(account_id = %account.id, "Account registered");

        Ok(account)
    }

    /// # Errors
    /// `InvalidCredential` for an unknown email or a wrong password.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, Error> {
        let email = normalize_email(email);

        let account = match self.accounts.find_by_email(&email).await {
            Ok(account) => Some(account),
            Err(StoreError::NotFound) => None,
            Err(err) => return Err(err.into()),
        };

        let verified = match account.as_ref().and_then(|a| a.password_hash.as_deref()) {
            Some(hash) => self.hasher.verify(password, hash),
            None => {
                self.burn_verification(password);
                false
            }
        };

        let Some(account) = account.filter(|_| verified) else {
            debug!("Login rejected");
            return Err(Error::InvalidCredential);
        };

        let token = self
            .tokens
            .issue(account.id, account.role, account.tenant_id)?;

        info!(account_id = %account.id, "Login succeeded");

        Ok(LoginResult { token, account })
    }

    /// Log in with a Google ID token, creating a donor account and its tenant
    /// on first sight of the email.
    ///
    /// # Errors
    /// `InvalidCredential` when the provider rejects the token, `Internal` when it
    /// cannot be reached.
    #[instrument(skip_all)]
    pub async fn authenticate_with_google(&self, id_token: &str) -> Result<LoginResult, Error> {
        let identity = self
            .verifier
            .verify(id_token, &self.google_client_id)
            .await
            .map_err(|err| match err {
                Error::Internal(_) => err,
                _ => Error::InvalidCredential,
            })?;

        let email = normalize_email(&identity.email);

        let account = match self.accounts.find_by_email(&email).await {
            Ok(account) => account,
            Err(StoreError::NotFound) => {
                let created = self
                    .provision(&identity.name, |tenant_id| {
                        Account::claimed(
                            identity.name.clone(),
                            email.clone(),
                            None,
                            Role::Donor,
                            tenant_id,
                            None,
                        )
                    })
                    .await;

                match created {
                    Ok(account) => {
                        info!(account_id = %account.id, "Account created from federated login");
                        account
                    }
                    // A concurrent first login won the insert.
                    Err(Error::DuplicateEmail) => self.accounts.find_by_email(&email).await?,
                    Err(err) => return Err(err),
                }
            }
            Err(err) => return Err(err.into()),
        };

        let token = self
            .tokens
            .issue(account.id, account.role, account.tenant_id)?;

        Ok(LoginResult { token, account })
    }

    async fn provision<F>(&self, name: &str, build: F) -> Result<Account, Error>
    where
        F: Fn(Uuid) -> Account,
    {
        let base = slugify(name);

        for candidate in slug::candidates(&base, SLUG_ATTEMPTS) {
            let tenant = Tenant::new(name.to_string(), candidate);
            let account = build(tenant.id);

            match self.accounts.provision(&tenant, &account).await {
                Ok(()) => return Ok(account),
                Err(StoreError::DuplicateSlug) => {
                    debug!("Tenant slug {} is taken", tenant.slug);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::Conflict("tenant slug is unavailable".to_string()))
    }

    fn burn_verification(&self, password: &str) {
        let hash = self
            .dummy_hash
            .get_or_init(|| self.hasher.hash(DUMMY_PASSWORD).unwrap_or_default());
        let _ = self.hasher.verify(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{google::VerifiedIdentity, password::test_hasher},
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use secrecy::SecretString;

    struct StaticVerifier(Result<VerifiedIdentity, fn() -> Error>);

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify(&self, _id_token: &str, _audience: &str) -> Result<VerifiedIdentity, Error> {
            match &self.0 {
                Ok(identity) => Ok(identity.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn service_with(
        store: Arc<MemoryStore>,
        verifier: StaticVerifier,
    ) -> (AuthService, Arc<TokenService>) {
        let config = AuthConfig::new(SecretString::from("service-secret"))
            .with_google_client_id("client-id".to_string());
        let tokens = Arc::new(TokenService::new(&config));
        let service = AuthService::new(store, tokens.clone(), Arc::new(verifier), &config)
            .with_hasher(test_hasher());
        (service, tokens)
    }

    fn service(store: Arc<MemoryStore>) -> (AuthService, Arc<TokenService>) {
        service_with(store, StaticVerifier(Err(|| Error::InvalidCredential)))
    }

    fn registration(name: &str, email: &str) -> Registration {
        Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            location_id: None,
        }
    }

    #[test]
    fn email_rules() {
        assert!(valid_email("donor@example.com"));
        assert!(!valid_email("donor@example"));
        assert!(!valid_email("donor example.com"));
        assert_eq!(normalize_email("  Donor@Example.COM "), "donor@example.com");
    }

    #[tokio::test]
    async fn register_provisions_one_tenant_and_hashes_password() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service(store.clone());

        let account = service
            .register(registration("Ana", "Ana@Example.com"), Role::Donor)
            .await
            .unwrap();

        assert_eq!(store.tenant_count().await, 1);
        assert_eq!(account.email.as_deref(), Some("ana@example.com"));
        let hash = account.password_hash.as_deref().unwrap();
        assert_ne!(hash, "correct horse");
        assert!(hash.starts_with("$argon2id$"));

        let tenant = store.tenant(account.tenant_id.unwrap()).await.unwrap();
        assert_eq!(tenant.slug, "ana");
    }

    #[tokio::test]
    async fn duplicate_email_creates_nothing() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service(store.clone());

        service
            .register(registration("Ana", "ana@example.com"), Role::Donor)
            .await
            .unwrap();
        let err = service
            .register(registration("Other", " ANA@example.com"), Role::Admin)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateEmail));
        assert_eq!(store.tenant_count().await, 1);
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn register_rejects_unknown_location() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service(store.clone());

        let mut input = registration("Ana", "ana@example.com");
        input.location_id = Some(Uuid::new_v4());

        let err = service.register(input, Role::Donor).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.tenant_count().await, 0);
        assert_eq!(store.account_count().await, 0);
    }

    #[tokio::test]
    async fn same_name_gets_suffixed_slug() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service(store.clone());

        let first = service
            .register(registration("Blood Bank", "one@example.com"), Role::Admin)
            .await
            .unwrap();
        let second = service
            .register(registration("Blood Bank", "two@example.com"), Role::Admin)
            .await
            .unwrap();

        assert_ne!(first.tenant_id, second.tenant_id);
        let slug = store.tenant(second.tenant_id.unwrap()).await.unwrap().slug;
        assert_eq!(slug, "blood-bank-2");
    }

    #[tokio::test]
    async fn register_validates_input() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service(store.clone());

        let mut input = registration("", "ana@example.com");
        assert!(matches!(
            service.register(input.clone(), Role::Donor).await,
            Err(Error::Validation(_))
        ));

        input.name = "Ana".to_string();
        input.email = "not-an-email".to_string();
        assert!(matches!(
            service.register(input.clone(), Role::Donor).await,
            Err(Error::Validation(_))
        ));

        input.email = "ana@example.com".to_string();
        input.password = "short".to_string();
        assert!(matches!(
            service.register(input, Role::Donor).await,
            Err(Error::Validation(_))
        ));

        assert_eq!(store.tenant_count().await, 0);
    }

    #[tokio::test]
    async fn login_issues_token_with_tenant() {
        let store = Arc::new(MemoryStore::default());
        let (service, tokens) = service(store);

        let account = service
            .register(registration("Ana", "ana@example.com"), Role::Admin)
            .await
            .unwrap();

        let result = service
            .login("ANA@example.com", "correct horse")
            .await
            .unwrap();
        let claims = tokens.validate(&result.token).unwrap();

        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.tenant_id, account.tenant_id.map(|id| id.to_string()));
    }

    #[tokio::test]
    async fn superadmin_token_has_no_tenant() {
        let store = Arc::new(MemoryStore::default());
        let (service, tokens) = service(store);

        service
            .register(registration("Root", "root@example.com"), Role::SuperAdmin)
            .await
            .unwrap();
        let result = service.login("root@example.com", "correct horse").await.unwrap();

        let claims = tokens.validate(&result.token).unwrap();
        assert_eq!(claims.role, "superadmin");
        assert_eq!(claims.tenant_id, None);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service(store);

        service
            .register(registration("Ana", "ana@example.com"), Role::Donor)
            .await
            .unwrap();

        let wrong_password = service.login("ana@example.com", "wrong password").await;
        let unknown_email = service.login("nobody@example.com", "correct horse").await;

        let (Err(a), Err(b)) = (wrong_password, unknown_email) else {
            panic!("both logins must fail");
        };
        assert!(matches!(a, Error::InvalidCredential));
        assert!(matches!(b, Error::InvalidCredential));
        assert_eq!(a.public_message(), b.public_message());
        assert_eq!(a.status(), b.status());
    }

    #[tokio::test]
    async fn google_login_creates_account_once() {
        let store = Arc::new(MemoryStore::default());
        let identity = VerifiedIdentity {
            email: "Fed@Example.com".to_string(),
            name: "Fed User".to_string(),
        };
        let (service, tokens) = service_with(store.clone(), StaticVerifier(Ok(identity)));

        let first = service.authenticate_with_google("id-token").await.unwrap();
        let second = service.authenticate_with_google("id-token").await.unwrap();

        assert_eq!(first.account.id, second.account.id);
        assert_eq!(first.account.role, Role::Donor);
        assert!(first.account.password_hash.is_none());
        assert_eq!(store.tenant_count().await, 1);
        assert_eq!(store.account_count().await, 1);

        let claims = tokens.validate(&second.token).unwrap();
        assert_eq!(claims.role, "donor");
    }

    #[tokio::test]
    async fn google_rejection_maps_to_invalid_credential() {
        let store = Arc::new(MemoryStore::default());
        let (service, _) = service_with(
            store.clone(),
            StaticVerifier(Err(|| Error::Validation("bad audience".to_string()))),
        );

        let err = service.authenticate_with_google("id-token").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredential));
        assert_eq!(store.account_count().await, 0);
    }

    #[tokio::test]
    async fn federated_account_cannot_password_login() {
        let store = Arc::new(MemoryStore::default());
        let identity = VerifiedIdentity {
            email: "fed@example.com".to_string(),
            name: "Fed".to_string(),
        };
        let (service, _) = service_with(store, StaticVerifier(Ok(identity)));

        service.authenticate_with_google("id-token").await.unwrap();
        let err = service.login("fed@example.com", "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredential));
    }
}
