/// Rider registration and login.

use std::sync::Arc;
use tracing::{info, warn};

use super::{
    hash_password, normalize_email, require_non_blank, verify_password, FieldError, ServiceError,
    ServiceResult,
};
use crate::auth::{authorization::Role, jwt::TokenIssuer, password::validate_password_strength};
use crate::models::account::{Account, AccountRole, NewAccount};
use crate::repository::AccountRepository;

/// Registration input, already shape-validated by the caller
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Account together with a freshly issued access token
#[derive(Debug, Clone)]
pub struct AccountSession {
    pub account: Account,
    pub token: String,
}

pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<TokenIssuer>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self { accounts, tokens }
    }

    /// Creates a rider account
    ///
    /// Fails with `Conflict` when the email is taken and `Validation` when the
    /// password does not meet the policy.
    pub async fn register(&self, input: RegisterAccount) -> ServiceResult<Account> {
        require_non_blank(&[
            ("name", Some(input.name.as_str())),
            ("phone", Some(input.phone.as_str())),
        ])?;
        validate_password_strength(&input.password)
            .map_err(|msg| ServiceError::Validation(vec![FieldError::new("password", msg)]))?;

        let email = normalize_email(&input.email);

        if self.accounts.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "Registration rejected: email already registered");
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(input.password).await?;

        let account = self
            .accounts
            .create(NewAccount {
                name: input.name.trim().to_string(),
                email,
                phone: input.phone.trim().to_string(),
                password_hash,
                role: AccountRole::Rider,
            })
            .await?;

        info!(account_id = %account.id, "Rider account registered");
        Ok(account)
    }

    /// Checks credentials and issues a token
    ///
    /// Unknown email and wrong password produce the same `Unauthorized` error.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AccountSession> {
        let email = normalize_email(email);
        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password.to_string(), account.password_hash.clone()).await? {
            warn!(account_id = %account.id, "Login rejected: wrong password");
            return Err(invalid());
        }

        let token = self
            .tokens
            .issue(account.id, &account.email, Role::from(account.role))?;

        info!(account_id = %account.id, "Rider logged in");
        Ok(AccountSession { account, token })
    }
}
