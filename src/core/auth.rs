//! # Authentication
//!
//! Login, logout and profile lookups. Owns every write to the token store;
//! the request pipeline only reads from it.
//!
//! ```text
//! login_with_google(id_token)
//!   └─► POST v1/api/auth/google ──► save token ──► save profile
//! logout()
//!   └─► POST v1/api/auth/logout ──► clear store (even if the call failed)
//! LogoutUseCase::execute()
//!   └─► clear store
//! ```

use std::fmt;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, LoginRequest, UserInfoDto};
use crate::store::{StoreError, TokenStore, UserProfile};

pub const GOOGLE_PROVIDER: &str = "google";

#[derive(Debug)]
pub enum AuthError {
    Api(ApiError),
    Store(StoreError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Api(e) => write!(f, "{e}"),
            AuthError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<ApiError> for AuthError {
    fn from(e: ApiError) -> Self {
        AuthError::Api(e)
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Store(e)
    }
}

pub struct AuthRepository {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
}

impl AuthRepository {
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self { api, store }
    }

    /// Exchanges a Google ID token for a backend session and persists it.
    pub async fn login_with_google(&self, id_token: &str) -> Result<UserProfile, AuthError> {
        info!("Calling backend login for provider {}", GOOGLE_PROVIDER);
        let request = LoginRequest {
            id_token: id_token.to_string(),
        };

        let login = self.api.login(GOOGLE_PROVIDER, &request).await?.into_data()?;
        debug!("Login accepted for user {} ({})", login.user_id, login.email);

        self.store.save_token(&login.access_token)?;
        let profile = UserProfile {
            user_id: login.user_id,
            email: login.email,
            name: login.name,
            picture: Some(login.picture),
            role: login.role,
        };
        self.store.save_user_info(&profile)?;
        info!("Session saved for user {}", profile.user_id);
        Ok(profile)
    }

    /// Tells the server, then drops the local session regardless of the outcome.
    /// Any response that arrives counts as a completed logout; only transport
    /// and status failures are returned.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let remote = self.api.logout().await;
        self.store.clear()?;
        match remote {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Server logout failed, local session cleared anyway: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn fetch_user_profile(&self) -> Result<UserInfoDto, AuthError> {
        Ok(self.api.fetch_user_profile().await?.into_data()?)
    }

    /// Profile from the local store; `None` without a stored email and name.
    pub fn user_info(&self) -> Option<UserInfoDto> {
        self.store.user_info()
    }
}

/// Ends the current session on this device. No server call is made.
pub struct LogoutUseCase {
    store: Arc<dyn TokenStore>,
}

impl LogoutUseCase {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn execute(&self) -> Result<(), AuthError> {
        debug!("Logout started");
        match self.store.clear() {
            Ok(()) => {
                debug!("Logout complete");
                Ok(())
            }
            Err(e) => {
                error!("Logout failed: {}", e);
                Err(e.into())
            }
        }
    }
}

pub struct GetUserInfoUseCase {
    repository: Arc<AuthRepository>,
}

impl GetUserInfoUseCase {
    pub fn new(repository: Arc<AuthRepository>) -> Self {
        Self { repository }
    }

    pub fn invoke(&self) -> Option<UserInfoDto> {
        self.repository.user_info()
    }
}
