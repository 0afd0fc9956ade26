//! Identity provider trait.

use super::ProviderResult;
use crate::attributes::{AttributeKey, UpdateAttributeResult, UserAttribute};
use crate::events::HubEventStream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;

/// The signed-in user as the identity provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Stable user id.
    pub user_id: String,
    /// Sign-in username (the phone number for this application).
    pub username: String,
}

/// Options for [`IdentityProvider::fetch_auth_session`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSessionOptions {
    /// Include identity-pool credentials (identity id, tokens) in the answer.
    pub include_credentials: bool,
    /// Force a token refresh instead of using cached tokens.
    pub force_refresh: bool,
}

impl FetchSessionOptions {
    /// Options that request embedded credentials.
    #[must_use]
    pub const fn with_credentials() -> Self {
        Self {
            include_credentials: true,
            force_refresh: false,
        }
    }
}

/// Session as the identity provider reports it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Whether a user is currently signed in.
    pub is_signed_in: bool,
    /// Raw id token, when credentials were requested.
    pub id_token: Option<String>,
    /// Identity-pool id, when credentials were requested.
    pub identity_id: Option<String>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("is_signed_in", &self.is_signed_in)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("identity_id", &self.identity_id)
            .finish()
    }
}

/// Options for [`IdentityProvider::sign_out`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOutOptions {
    /// Invalidate tokens on every device, not just this one.
    pub global: bool,
}

/// Sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    /// Username (phone number).
    pub username: String,
    /// Password.
    pub password: String,
    /// Attributes registered with the new account.
    pub attributes: Vec<UserAttribute>,
}

/// Outcome of a sign-up step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignUpOutcome {
    /// `false` when a further challenge (confirmation code) is pending.
    pub is_sign_up_complete: bool,
}

/// Outcome of a sign-in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignInOutcome {
    /// `false` when a further challenge is pending.
    pub is_signed_in: bool,
}

/// Outcome of a password reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPasswordOutcome {
    /// `false` when a confirmation code must still be submitted.
    pub is_password_reset: bool,
}

/// Identity provider.
///
/// This trait abstracts over the managed identity service: credential
/// checks, sessions, account lifecycle and profile attributes.
///
/// # Implementation Notes
///
/// - Every call is a single request/response; no retries are expected
/// - Failures carry only a human-readable message
/// - [`hub_events`](Self::hub_events) is the provider's single global push
///   channel; the coordinator subscribes to it exactly once
pub trait IdentityProvider: Send + Sync {
    /// Get the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns error if nobody is signed in or the request fails.
    fn current_user(&self) -> impl Future<Output = ProviderResult<AuthUser>> + Send;

    /// Fetch the current session.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn fetch_auth_session(
        &self,
        options: FetchSessionOptions,
    ) -> impl Future<Output = ProviderResult<AuthSession>> + Send;

    /// Sign out, optionally on every device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn sign_out(&self, options: SignOutOptions) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Delete the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn delete_user(&self) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns error if the username exists, the password is rejected or
    /// the request fails.
    fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> impl Future<Output = ProviderResult<SignUpOutcome>> + Send;

    /// Confirm a sign-up with the code delivered to the user.
    ///
    /// # Errors
    ///
    /// Returns error if the code is wrong or expired.
    fn confirm_sign_up(
        &self,
        username: &str,
        code: &str,
    ) -> impl Future<Output = ProviderResult<SignUpOutcome>> + Send;

    /// Resend the sign-up confirmation code.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn resend_sign_up_code(&self, username: &str)
    -> impl Future<Output = ProviderResult<()>> + Send;

    /// Sign in with username and password.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are rejected or the request fails.
    fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<SignInOutcome>> + Send;

    /// Answer a pending sign-in challenge.
    ///
    /// # Errors
    ///
    /// Returns error if the code is wrong or no challenge is pending.
    fn confirm_sign_in(
        &self,
        code: &str,
    ) -> impl Future<Output = ProviderResult<SignInOutcome>> + Send;

    /// Start a password reset.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn reset_password(
        &self,
        username: &str,
    ) -> impl Future<Output = ProviderResult<ResetPasswordOutcome>> + Send;

    /// Finish a password reset.
    ///
    /// # Errors
    ///
    /// Returns error if the code is wrong or the password is rejected.
    fn confirm_reset_password(
        &self,
        username: &str,
        new_password: &str,
        code: &str,
    ) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns error if the old password is wrong or the request fails.
    fn update_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> impl Future<Output = ProviderResult<()>> + Send;

    /// Fetch every attribute of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn fetch_user_attributes(
        &self,
    ) -> impl Future<Output = ProviderResult<Vec<UserAttribute>>> + Send;

    /// Update several attributes in one batch.
    ///
    /// # Returns
    ///
    /// One result per submitted key.
    ///
    /// # Errors
    ///
    /// Returns error if the request as a whole fails.
    fn update_user_attributes(
        &self,
        attributes: Vec<UserAttribute>,
    ) -> impl Future<Output = ProviderResult<HashMap<AttributeKey, UpdateAttributeResult>>> + Send;

    /// Subscribe to the provider's raw event channel.
    fn hub_events(&self) -> HubEventStream;
}
