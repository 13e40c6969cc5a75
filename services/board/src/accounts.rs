//! Account lifecycle: verification codes, signup, login and access upgrade
//!
//! An account moves through `unclaimed -> temporary -> active(read) ->
//! active(write)` and never goes back. Requesting a code claims the email as
//! a temporary account; completing signup with that code sets the password
//! and grants read access; the shared upgrade code grants write access.
//!
//! Requesting a code also overwrites the code of an already active account,
//! and login compares against that code without consuming it. Both are
//! observed behaviors that callers rely on.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    codes::generate_verification_code,
    error::{AppError, AppResult},
    hasher::CredentialHasher,
    jwt::JwtService,
    mailer::Notifier,
    models::{AccessLevel, Account, AccountLookupView, AccountView, NewAccount},
    repositories::AccountStore,
    validation::{normalize_email, require_field, validate_email, validate_password},
};

/// Request for a verification code
#[derive(Debug, Default, Deserialize)]
pub struct VerificationRequest {
    pub email: Option<String>,
}

/// Email, password and verification code, for signup and login
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub verification_code: Option<String>,
}

/// Request for write access
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub upgrade_code: Option<String>,
}

/// A freshly issued session token and the account it describes
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub account: AccountView,
    pub token: String,
}

/// Account lifecycle controller
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    notifier: Arc<dyn Notifier>,
    hasher: CredentialHasher,
    jwt: JwtService,
    upgrade_code: String,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        notifier: Arc<dyn Notifier>,
        hasher: CredentialHasher,
        jwt: JwtService,
        upgrade_code: String,
    ) -> Self {
        Self {
            accounts,
            notifier,
            hasher,
            jwt,
            upgrade_code,
        }
    }

    /// Issue a new verification code for `email` and send it.
    ///
    /// The code is stored before delivery is attempted and stays stored if
    /// delivery fails.
    pub async fn initiate_verification(&self, request: &VerificationRequest) -> AppResult<()> {
        let email = require_field(request.email.as_deref(), "Email is required")
            .map_err(AppError::Validation)?;
        let email = normalize_email(email);
        validate_email(&email).map_err(AppError::Validation)?;

        let code = generate_verification_code();

        match self.accounts.find_by_email(&email).await? {
            Some(mut account) => {
                account.verification_code = Some(code.clone());
                self.accounts.save(&account).await?;
            }
            None => {
                self.accounts
                    .insert_temporary(&NewAccount {
                        email: email.clone(),
                        verification_code: code.clone(),
                    })
                    .await?;
            }
        }

        self.notifier
            .send_verification_code(&email, &code)
            .await
            .map_err(|e| {
                warn!("Failed to send verification code to {}: {:#}", email, e);
                AppError::Delivery("Failed to send verification email".to_string())
            })?;

        info!("Verification code issued for {}", email);
        Ok(())
    }

    /// Turn a temporary account into an active one with read access
    pub async fn complete_signup(&self, request: &CredentialsRequest) -> AppResult<AccountView> {
        let missing = "Email and password are required";
        let email = require_field(request.email.as_deref(), missing)
            .map_err(AppError::Validation)?;
        let password = require_field(request.password.as_deref(), missing)
            .map_err(AppError::Validation)?;
        validate_password(password).map_err(AppError::Validation)?;
        let email = normalize_email(email);

        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            return Err(AppError::NotFound(
                "No verification code found, send the verification code first".to_string(),
            ));
        };

        if !account.is_temporary {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        if !code_matches(&account, request.verification_code.as_deref()) {
            warn!("Signup rejected for {}: verification code mismatch", email);
            return Err(AppError::InvalidCode(
                "Invalid verification code".to_string(),
            ));
        }

        account.password_hash = Some(self.hasher.hash(password)?);
        account.is_temporary = false;
        account.access_level = Some(AccessLevel::Read);
        account.verification_code = None;
        let account = self.accounts.save(&account).await?;

        info!("Signup completed for {}", account.email);
        Ok(account.to_view())
    }

    /// Check credentials and the current verification code, then issue a
    /// session token. The code is left in place.
    pub async fn login(&self, request: &CredentialsRequest) -> AppResult<IssuedSession> {
        let missing = "Email and password are required";
        let email = require_field(request.email.as_deref(), missing)
            .map_err(AppError::Validation)?;
        let password = require_field(request.password.as_deref(), missing)
            .map_err(AppError::Validation)?;
        let code = require_field(
            request.verification_code.as_deref(),
            "Verification code is required",
        )
        .map_err(AppError::Validation)?;
        let email = normalize_email(email);

        let invalid_credentials = || AppError::Auth("Invalid credentials".to_string());

        let account = match self.accounts.find_by_email(&email).await? {
            Some(account) if !account.is_temporary => account,
            _ => {
                warn!("Login rejected for {}: no active account", email);
                return Err(invalid_credentials());
            }
        };

        if !code_matches(&account, Some(code)) {
            warn!("Login rejected for {}: verification code mismatch", email);
            return Err(AppError::Auth("Invalid verification code".to_string()));
        }

        let Some(password_hash) = account.password_hash.as_deref() else {
            return Err(invalid_credentials());
        };
        if !self.hasher.verify(password, password_hash)? {
            warn!("Login rejected for {}: wrong password", email);
            return Err(invalid_credentials());
        }

        let token = self.jwt.issue(&account)?;
        info!("Login successful for {}", account.email);
        Ok(IssuedSession {
            account: account.to_view(),
            token,
        })
    }

    /// Grant write access to the signed-in account and issue a replacement
    /// token. Tokens issued earlier keep their old access level.
    pub async fn upgrade_access(
        &self,
        account_id: Uuid,
        request: &UpgradeRequest,
    ) -> AppResult<IssuedSession> {
        let upgrade_code = require_field(request.upgrade_code.as_deref(), "Upgrade code is required")
            .map_err(AppError::Validation)?;

        if upgrade_code.to_lowercase() != self.upgrade_code.to_lowercase() {
            warn!("Upgrade rejected for {}: invalid upgrade code", account_id);
            return Err(AppError::InvalidCode("Invalid upgrade code".to_string()));
        }

        let account = self.current_account(account_id).await?;

        if account.access_level == Some(AccessLevel::Write) {
            return Err(AppError::Conflict(
                "User already has write access".to_string(),
            ));
        }

        // Only the level is written so a code issued meanwhile survives
        let account = self
            .accounts
            .set_access_level(account.id, AccessLevel::Write)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let token = self.jwt.issue(&account)?;

        info!("Upgraded {} to write access", account.email);
        Ok(IssuedSession {
            account: account.to_view(),
            token,
        })
    }

    /// Load the account a session belongs to
    pub async fn current_account(&self, account_id: Uuid) -> AppResult<Account> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Look an account up by email, including its pending verification code
    pub async fn lookup_by_email(&self, email: Option<&str>) -> AppResult<AccountLookupView> {
        let email = require_field(email, "Email parameter is required")
            .map_err(AppError::Validation)?;

        self.accounts
            .find_by_email(&normalize_email(email))
            .await?
            .map(|account| account.to_lookup_view())
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

fn code_matches(account: &Account, supplied: Option<&str>) -> bool {
    matches!(
        (account.verification_code.as_deref(), supplied),
        (Some(stored), Some(supplied)) if stored == supplied
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::{DEFAULT_TOKEN_EXPIRY, JwtConfig},
        repositories::MemoryStore,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_verification_code(&self, email: &str, code: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("smtp unavailable");
            }
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), code.to_string()));
            Ok(())
        }
    }

    struct Harness {
        store: MemoryStore,
        notifier: Arc<RecordingNotifier>,
        jwt: JwtService,
        service: AccountService,
    }

    fn harness_with(notifier: RecordingNotifier) -> Harness {
        let store = MemoryStore::new();
        let notifier = Arc::new(notifier);
        let jwt = JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        });
        let service = AccountService::new(
            Arc::new(store.clone()),
            notifier.clone(),
            CredentialHasher::with_params(8, 1, 1).unwrap(),
            jwt.clone(),
            "alkira".to_string(),
        );
        Harness {
            store,
            notifier,
            jwt,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingNotifier::default())
    }

    fn verification(email: &str) -> VerificationRequest {
        VerificationRequest {
            email: Some(email.to_string()),
        }
    }

    fn credentials(email: &str, password: &str, code: &str) -> CredentialsRequest {
        CredentialsRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            verification_code: Some(code.to_string()),
        }
    }

    impl Harness {
        async fn stored(&self, email: &str) -> Account {
            self.store.find_by_email(email).await.unwrap().unwrap()
        }

        async fn send_code(&self, email: &str) -> String {
            self.service
                .initiate_verification(&verification(email))
                .await
                .unwrap();
            self.stored(&normalize_email(email))
                .await
                .verification_code
                .unwrap()
        }

        async fn signed_up(&self, email: &str, password: &str) -> String {
            let code = self.send_code(email).await;
            self.service
                .complete_signup(&credentials(email, password, &code))
                .await
                .unwrap();
            code
        }
    }

    #[tokio::test]
    async fn initiate_creates_temporary_account_with_code() {
        let h = harness();
        h.service
            .initiate_verification(&verification(" A@X.com "))
            .await
            .unwrap();

        let account = h.stored("a@x.com").await;
        assert!(account.is_temporary);
        assert!(account.password_hash.is_none());
        assert!(account.access_level.is_none());
        let code = account.verification_code.unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let sent = h.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![("a@x.com".to_string(), code)]);
    }

    #[tokio::test]
    async fn initiate_rejects_missing_or_malformed_email() {
        let h = harness();
        let missing = h
            .service
            .initiate_verification(&VerificationRequest::default())
            .await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let malformed = h
            .service
            .initiate_verification(&verification("not-an-email"))
            .await;
        assert!(matches!(malformed, Err(AppError::Validation(_))));
        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_keeps_stored_code() {
        let h = harness_with(RecordingNotifier {
            fail: true,
            ..Default::default()
        });

        let result = h
            .service
            .initiate_verification(&verification("a@x.com"))
            .await;
        assert!(matches!(result, Err(AppError::Delivery(_))));

        let account = h.stored("a@x.com").await;
        assert!(account.is_temporary);
        assert!(account.verification_code.is_some());
    }

    #[tokio::test]
    async fn initiate_overwrites_code_of_active_account() {
        let h = harness();
        h.signed_up("a@x.com", "pw123456").await;
        assert!(h.stored("a@x.com").await.verification_code.is_none());

        let code = h.send_code("a@x.com").await;
        let account = h.stored("a@x.com").await;
        assert!(!account.is_temporary);
        assert_eq!(account.access_level, Some(AccessLevel::Read));
        assert_eq!(account.verification_code, Some(code));
    }

    #[tokio::test]
    async fn signup_with_wrong_code_changes_nothing() {
        let h = harness();
        let code = h.send_code("a@x.com").await;
        let wrong = if code == "999999" { "100000" } else { "999999" };

        let result = h
            .service
            .complete_signup(&credentials("a@x.com", "pw123456", wrong))
            .await;
        assert!(matches!(result, Err(AppError::InvalidCode(_))));

        let missing_code = h
            .service
            .complete_signup(&CredentialsRequest {
                verification_code: None,
                ..credentials("a@x.com", "pw123456", "")
            })
            .await;
        assert!(matches!(missing_code, Err(AppError::InvalidCode(_))));

        let account = h.stored("a@x.com").await;
        assert!(account.is_temporary);
        assert!(account.password_hash.is_none());
        assert_eq!(account.verification_code, Some(code));
    }

    #[tokio::test]
    async fn signup_requires_prior_code_request() {
        let h = harness();
        let result = h
            .service
            .complete_signup(&credentials("a@x.com", "pw123456", "123456"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn signup_validates_fields() {
        let h = harness();
        let no_password = h
            .service
            .complete_signup(&CredentialsRequest {
                password: None,
                ..credentials("a@x.com", "", "123456")
            })
            .await;
        assert!(matches!(no_password, Err(AppError::Validation(_))));

        let short = h
            .service
            .complete_signup(&credentials("a@x.com", "pw1", "123456"))
            .await;
        assert!(matches!(short, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn signup_activates_with_read_access_once() {
        let h = harness();
        let code = h.send_code("a@x.com").await;

        let view = h
            .service
            .complete_signup(&credentials("A@x.com", "pw123456", &code))
            .await
            .unwrap();
        assert_eq!(view.email, "a@x.com");
        assert!(!view.is_temporary);
        assert_eq!(view.access_level, Some(AccessLevel::Read));

        let account = h.stored("a@x.com").await;
        assert!(account.verification_code.is_none());
        assert!(account.password_hash.is_some());

        let again = h
            .service
            .complete_signup(&credentials("a@x.com", "pw123456", &code))
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn login_rejects_temporary_accounts() {
        let h = harness();
        let code = h.send_code("a@x.com").await;

        let result = h
            .service
            .login(&credentials("a@x.com", "pw123456", &code))
            .await;
        match result {
            Err(AppError::Auth(message)) => assert_eq!(message, "Invalid credentials"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_requires_every_field() {
        let h = harness();
        let result = h
            .service
            .login(&CredentialsRequest {
                verification_code: None,
                ..credentials("a@x.com", "pw123456", "")
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn login_checks_code_then_password() {
        let h = harness();
        h.signed_up("a@x.com", "pw123456").await;
        let code = h.send_code("a@x.com").await;
        let wrong = if code == "999999" { "100000" } else { "999999" };

        match h
            .service
            .login(&credentials("a@x.com", "pw123456", wrong))
            .await
        {
            Err(AppError::Auth(message)) => assert_eq!(message, "Invalid verification code"),
            other => panic!("expected code mismatch, got {other:?}"),
        }

        match h
            .service
            .login(&credentials("a@x.com", "wrong-password", &code))
            .await
        {
            Err(AppError::Auth(message)) => assert_eq!(message, "Invalid credentials"),
            other => panic!("expected bad password, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_issues_token_and_keeps_code() {
        let h = harness();
        h.signed_up("a@x.com", "pw123456").await;
        let code = h.send_code("a@x.com").await;

        let session = h
            .service
            .login(&credentials("a@x.com", "pw123456", &code))
            .await
            .unwrap();
        let claims = h.jwt.validate_token(&session.token).unwrap();
        assert_eq!(claims.sub, session.account.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.access_level, Some(AccessLevel::Read));

        // The same code keeps working until a new one is issued
        assert!(
            h.service
                .login(&credentials("a@x.com", "pw123456", &code))
                .await
                .is_ok()
        );
        assert_eq!(h.stored("a@x.com").await.verification_code, Some(code));
    }

    #[tokio::test]
    async fn upgrade_grants_write_once_and_leaves_old_tokens_stale() {
        let h = harness();
        h.signed_up("a@x.com", "pw123456").await;
        let code = h.send_code("a@x.com").await;
        let session = h
            .service
            .login(&credentials("a@x.com", "pw123456", &code))
            .await
            .unwrap();
        let id = session.account.id;

        let upgraded = h
            .service
            .upgrade_access(
                id,
                &UpgradeRequest {
                    upgrade_code: Some("ALKIRA".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(upgraded.account.access_level, Some(AccessLevel::Write));
        let fresh = h.jwt.validate_token(&upgraded.token).unwrap();
        assert_eq!(fresh.access_level, Some(AccessLevel::Write));

        let stale = h.jwt.validate_token(&session.token).unwrap();
        assert_eq!(stale.access_level, Some(AccessLevel::Read));

        // The stored code is untouched, so the current login code still works
        assert_eq!(h.stored("a@x.com").await.verification_code, Some(code.clone()));
        assert!(
            h.service
                .login(&credentials("a@x.com", "pw123456", &code))
                .await
                .is_ok()
        );

        let again = h
            .service
            .upgrade_access(
                id,
                &UpgradeRequest {
                    upgrade_code: Some("alkira".to_string()),
                },
            )
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn upgrade_failures() {
        let h = harness();
        h.signed_up("a@x.com", "pw123456").await;
        let id = h.stored("a@x.com").await.id;

        let missing = h
            .service
            .upgrade_access(id, &UpgradeRequest::default())
            .await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let wrong = h
            .service
            .upgrade_access(
                id,
                &UpgradeRequest {
                    upgrade_code: Some("open-sesame".to_string()),
                },
            )
            .await;
        assert!(matches!(wrong, Err(AppError::InvalidCode(_))));
        assert_eq!(
            h.stored("a@x.com").await.access_level,
            Some(AccessLevel::Read)
        );

        let gone = h
            .service
            .upgrade_access(
                Uuid::new_v4(),
                &UpgradeRequest {
                    upgrade_code: Some("alkira".to_string()),
                },
            )
            .await;
        assert!(matches!(gone, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn lookup_by_email_exposes_code() {
        let h = harness();
        let code = h.send_code("a@x.com").await;

        let view = h.service.lookup_by_email(Some("A@X.COM")).await.unwrap();
        assert!(view.account.is_temporary);
        assert_eq!(view.verification_code, Some(code));

        assert!(matches!(
            h.service.lookup_by_email(None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            h.service.lookup_by_email(Some("b@x.com")).await,
            Err(AppError::NotFound(_))
        ));
    }
}
