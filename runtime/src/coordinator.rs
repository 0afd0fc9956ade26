//! Session coordinator.
//!
//! The coordinator owns the single upstream subscription to the identity
//! provider's raw event channel, translates a whitelist of raw events into
//! [`AuthenticationStatus`] emissions, and wraps every identity/storage call
//! with input normalization, a user-record update on success and error
//! translation.
//!
//! # Error policy
//!
//! | operation       | on provider failure                 | after close              |
//! |-----------------|-------------------------------------|--------------------------|
//! | `is_signed_in`  | `false`, nothing emitted            | `false`, nothing emitted |
//! | `fetch_session` | `None`                              | `None`                   |
//! | `delete_user`   | [`AuthError::Provider`] (unwrapped) | [`AuthError::Disposed`]  |
//! | everything else | [`AuthError::Authentication`]       | [`AuthError::Disposed`]  |
//!
//! Every operation fails with [`AuthError::Disposed`] after
//! [`close`](SessionCoordinator::close), except the two status probes which
//! answer `false`/`None`.
//!
//! # Example
//!
//! ```ignore
//! let handle = platform::configure(&runtime, &platform_config).await?;
//! let coordinator = SessionCoordinator::new(handle, CoordinatorConfig::default())?;
//!
//! let mut statuses = coordinator.subscribe()?;
//! if coordinator.sign_in("+15550100", "hunter2", false).await? {
//!     assert_eq!(statuses.recv().await, Some(AuthenticationStatus::Authenticated));
//! }
//!
//! coordinator.close();
//! ```

use crate::metrics::CoordinatorMetrics;
use crate::notifier::{ListenerHandle, StatusNotifier, StatusSubscription};
use crate::platform::{self, PlatformHandle};
use composable_identity_core::events::names;
use composable_identity_core::providers::{
    AccessLevel, FetchSessionOptions, IdentityProvider, PlatformRuntime, SignOutOptions,
    SignUpRequest, StorageProvider, UploadRequest,
};
use composable_identity_core::{
    AttributeKey, AuthError, AuthenticationStatus, CoordinatorConfig, HubEvent, PlatformConfig,
    ProviderError, Result, User, UserAttribute, UserPatch,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;

/// Metadata key holding the uploader's user id.
pub const METADATA_OWNER: &str = "owner";
/// Metadata key holding the upload description.
pub const METADATA_DESCRIPTION: &str = "description";

/// Translate a raw provider event into a status.
///
/// Only sign-out, session expiry and account deletion map to a status;
/// every other event is ignored.
#[must_use]
pub fn translate_event(event: &HubEvent) -> Option<AuthenticationStatus> {
    match event.name.as_str() {
        names::SIGNED_OUT | names::SESSION_EXPIRED | names::USER_DELETED => {
            Some(AuthenticationStatus::Unauthenticated)
        }
        _ => None,
    }
}

/// Wrap a provider failure as [`AuthError::Authentication`], logging and
/// counting it under `operation`.
fn wrap(operation: &'static str) -> impl FnOnce(ProviderError) -> AuthError {
    move |error| {
        CoordinatorMetrics::record_failure(operation);
        tracing::warn!(operation, error = %error, "Provider call failed");
        AuthError::authentication(&error)
    }
}

/// Orchestrates identity and storage calls and publishes authentication status.
pub struct SessionCoordinator<I, S>
where
    I: IdentityProvider + 'static,
    S: StorageProvider + 'static,
{
    identity: Arc<I>,
    storage: Arc<S>,
    config: CoordinatorConfig,
    user: RwLock<User>,
    notifier: Arc<StatusNotifier>,
    upstream: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl<I, S> SessionCoordinator<I, S>
where
    I: IdentityProvider + 'static,
    S: StorageProvider + 'static,
{
    /// Create a coordinator and attach it to the provider's event channel.
    ///
    /// Must be called from within a Tokio runtime; the upstream subscription
    /// runs on its own task.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Configuration`] if `config` is invalid or no Tokio runtime is available
    pub fn new(handle: PlatformHandle<I, S>, config: CoordinatorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AuthError::Configuration(e.to_string()))?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            AuthError::Configuration(format!("Session coordinator needs a Tokio runtime: {e}"))
        })?;

        let identity = handle.identity();
        let notifier = Arc::new(StatusNotifier::new());

        // Subscribe before spawning so nothing published after `new` returns is missed.
        let mut events = identity.hub_events();
        let upstream_notifier = Arc::clone(&notifier);
        let upstream = runtime.spawn(async move {
            while let Some(event) = events.next().await {
                let status = translate_event(&event);
                CoordinatorMetrics::record_hub_event(&event.name, status.is_some());
                match status {
                    Some(status) => {
                        tracing::info!(event = %event.name, %status, "Provider event translated");
                        if upstream_notifier.emit(status).is_err() {
                            break;
                        }
                    }
                    None => tracing::debug!(event = %event.name, "Provider event ignored"),
                }
            }
            tracing::debug!("Provider event stream ended");
        });
        tracing::info!("Session coordinator attached to provider events");

        Ok(Self {
            identity,
            storage: handle.storage(),
            config,
            user: RwLock::new(User::empty()),
            notifier,
            upstream: Mutex::new(Some(upstream)),
            disposed: AtomicBool::new(false),
        })
    }

    /// Configure the platform runtime and create a coordinator over it.
    ///
    /// # Errors
    ///
    /// See [`platform::configure`] and [`SessionCoordinator::new`].
    pub async fn configure<P>(
        runtime: &P,
        platform_config: &PlatformConfig,
        config: CoordinatorConfig,
    ) -> Result<Self>
    where
        P: PlatformRuntime<Identity = I, Storage = S>,
    {
        let handle = platform::configure(runtime, platform_config).await?;
        Self::new(handle, config)
    }

    // ═══════════════════════════════════════════════════════════
    // Lifecycle and status
    // ═══════════════════════════════════════════════════════════

    /// Subscribe to status changes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Disposed`] after [`close`](Self::close).
    pub fn subscribe(&self) -> Result<StatusSubscription> {
        self.notifier.subscribe()
    }

    /// Register a callback for status changes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Disposed`] after [`close`](Self::close).
    pub fn listen<F>(&self, callback: F) -> Result<ListenerHandle>
    where
        F: FnMut(AuthenticationStatus) + Send + 'static,
    {
        self.notifier.listen(callback)
    }

    /// Last status emitted.
    #[must_use]
    pub fn status(&self) -> AuthenticationStatus {
        self.notifier.current()
    }

    /// Snapshot of the stored user record.
    #[must_use]
    pub fn user(&self) -> User {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Detach from the provider's event channel and close the status channel.
    ///
    /// # Returns
    ///
    /// `true` if this call closed the coordinator, `false` if it was already closed.
    pub fn close(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(upstream) = self
            .upstream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            upstream.abort();
        }
        self.notifier.close();
        tracing::info!("Session coordinator closed");
        true
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(AuthError::Disposed)
        } else {
            Ok(())
        }
    }

    fn publish(&self, status: AuthenticationStatus) {
        if let Err(e) = self.notifier.emit(status) {
            tracing::debug!(%status, error = %e, "Status dropped");
        }
    }

    // Read and replace under one write lock so concurrent patches never interleave.
    fn update_user(&self, patch: UserPatch) -> User {
        let mut user = self.user.write().unwrap_or_else(PoisonError::into_inner);
        *user = user.copy_with(patch);
        user.clone()
    }

    fn replace_user(&self, replacement: impl FnOnce(&User) -> User) -> User {
        let mut user = self.user.write().unwrap_or_else(PoisonError::into_inner);
        *user = replacement(&user);
        user.clone()
    }

    // ═══════════════════════════════════════════════════════════
    // Session queries
    // ═══════════════════════════════════════════════════════════

    /// Query the signed-in user.
    ///
    /// Merges `id` and `phone_number` into the stored record and returns a
    /// fresh [`User`] carrying only those two fields; it is not the stored
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self), name = "get_current_user")]
    pub async fn get_current_user(&self) -> Result<User> {
        self.ensure_open()?;
        let current = self
            .identity
            .current_user()
            .await
            .map_err(wrap("get_current_user"))?;

        let patch = UserPatch::new()
            .id(current.user_id.clone())
            .phone_number(current.username.clone());
        self.update_user(patch.clone());
        Ok(User::empty().copy_with(patch))
    }

    /// Probe whether a user is signed in.
    ///
    /// Emits `Authenticated` or `Unauthenticated` on every successful probe.
    /// Provider failures answer `false` without emitting.
    #[tracing::instrument(skip(self), name = "is_signed_in")]
    pub async fn is_signed_in(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        match self
            .identity
            .fetch_auth_session(FetchSessionOptions::default())
            .await
        {
            Ok(session) => {
                self.publish(if session.is_signed_in {
                    AuthenticationStatus::Authenticated
                } else {
                    AuthenticationStatus::Unauthenticated
                });
                session.is_signed_in
            }
            Err(e) => {
                CoordinatorMetrics::record_failure("is_signed_in");
                tracing::warn!(error = %e, "Session probe failed, reporting signed out");
                false
            }
        }
    }

    /// Fetch the session with credentials and store its token and identity id.
    ///
    /// Returns the updated record, or `None` if the provider call fails.
    #[tracing::instrument(skip(self), name = "fetch_session")]
    pub async fn fetch_session(&self) -> Option<User> {
        if self.is_closed() {
            return None;
        }
        match self
            .identity
            .fetch_auth_session(FetchSessionOptions::with_credentials())
            .await
        {
            Ok(session) => Some(self.update_user(
                UserPatch::new()
                    .session_token(session.id_token)
                    .identity_id(session.identity_id),
            )),
            Err(e) => {
                CoordinatorMetrics::record_failure("fetch_session");
                tracing::warn!(error = %e, "Session fetch failed");
                None
            }
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Account lifecycle
    // ═══════════════════════════════════════════════════════════

    /// Sign out on this device.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    pub async fn sign_out(&self) -> Result<()> {
        self.sign_out_with(SignOutOptions { global: false }).await
    }

    /// Sign out on every device.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    pub async fn global_sign_out(&self) -> Result<()> {
        self.sign_out_with(SignOutOptions { global: true }).await
    }

    #[tracing::instrument(skip(self), name = "sign_out")]
    async fn sign_out_with(&self, options: SignOutOptions) -> Result<()> {
        self.ensure_open()?;
        self.identity
            .sign_out(options)
            .await
            .map_err(wrap("sign_out"))
    }

    /// Delete the signed-in account.
    ///
    /// Unlike the other operations, provider failures are returned unwrapped
    /// as [`AuthError::Provider`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Provider`] if the provider call fails.
    #[tracing::instrument(skip(self), name = "delete_user")]
    pub async fn delete_user(&self) -> Result<()> {
        self.ensure_open()?;
        self.identity.delete_user().await.map_err(|e| {
            CoordinatorMetrics::record_failure("delete_user");
            AuthError::Provider(e)
        })
    }

    /// Register an account keyed by phone number.
    ///
    /// Inputs are trimmed. The account is created with the phone number and
    /// an empty email attribute.
    ///
    /// # Returns
    ///
    /// `true` if sign-up completed without a further confirmation step.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self, password), name = "sign_up")]
    pub async fn sign_up(&self, phone_number: &str, password: &str) -> Result<bool> {
        self.ensure_open()?;
        let phone_number = phone_number.trim();
        let request = SignUpRequest {
            username: phone_number.to_string(),
            password: password.trim().to_string(),
            attributes: vec![
                UserAttribute::new(AttributeKey::PhoneNumber, phone_number),
                UserAttribute::new(AttributeKey::Email, ""),
            ],
        };
        let outcome = self
            .identity
            .sign_up(request)
            .await
            .map_err(wrap("sign_up"))?;
        Ok(outcome.is_sign_up_complete)
    }

    /// Confirm sign-up with the delivered code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self, code), name = "confirm_sign_up")]
    pub async fn confirm_sign_up(&self, phone_number: &str, code: &str) -> Result<bool> {
        self.ensure_open()?;
        let outcome = self
            .identity
            .confirm_sign_up(phone_number.trim(), code.trim())
            .await
            .map_err(wrap("confirm_sign_up"))?;
        Ok(outcome.is_sign_up_complete)
    }

    /// Resend the sign-up confirmation code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self), name = "resend_sign_up_code")]
    pub async fn resend_sign_up_code(&self, phone_number: &str) -> Result<()> {
        self.ensure_open()?;
        self.identity
            .resend_sign_up_code(phone_number.trim())
            .await
            .map_err(wrap("resend_sign_up_code"))
    }

    /// Sign in with phone number and password.
    ///
    /// On success emits `AuthenticatedOnSignUp` when `sign_up_flow` is set,
    /// otherwise `Authenticated`. Nothing is emitted when a further challenge
    /// is pending or the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self, password), name = "sign_in")]
    pub async fn sign_in(
        &self,
        phone_number: &str,
        password: &str,
        sign_up_flow: bool,
    ) -> Result<bool> {
        self.ensure_open()?;
        let outcome = self
            .identity
            .sign_in(phone_number.trim(), password.trim())
            .await
            .map_err(wrap("sign_in"))?;

        if outcome.is_signed_in {
            self.publish(if sign_up_flow {
                AuthenticationStatus::AuthenticatedOnSignUp
            } else {
                AuthenticationStatus::Authenticated
            });
        }
        Ok(outcome.is_signed_in)
    }

    /// Answer a pending sign-in challenge. Emits nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self, code), name = "confirm_sign_in")]
    pub async fn confirm_sign_in(&self, code: &str) -> Result<bool> {
        self.ensure_open()?;
        let outcome = self
            .identity
            .confirm_sign_in(code.trim())
            .await
            .map_err(wrap("confirm_sign_in"))?;
        Ok(outcome.is_signed_in)
    }

    // ═══════════════════════════════════════════════════════════
    // Passwords
    // ═══════════════════════════════════════════════════════════

    /// Start a password reset.
    ///
    /// # Returns
    ///
    /// `true` if the reset completed without a confirmation code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self), name = "reset_password")]
    pub async fn reset_password(&self, phone_number: &str) -> Result<bool> {
        self.ensure_open()?;
        let outcome = self
            .identity
            .reset_password(phone_number.trim())
            .await
            .map_err(wrap("reset_password"))?;
        Ok(outcome.is_password_reset)
    }

    /// Finish a password reset.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self, new_password, code), name = "confirm_reset_password")]
    pub async fn confirm_reset_password(
        &self,
        phone_number: &str,
        new_password: &str,
        code: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        self.identity
            .confirm_reset_password(phone_number.trim(), new_password.trim(), code.trim())
            .await
            .map_err(wrap("confirm_reset_password"))
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip_all, name = "update_password")]
    pub async fn update_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        self.ensure_open()?;
        self.identity
            .update_password(old_password.trim(), new_password.trim())
            .await
            .map_err(wrap("update_password"))
    }

    // ═══════════════════════════════════════════════════════════
    // Attributes
    // ═══════════════════════════════════════════════════════════

    /// Update the profile attributes in one batch.
    ///
    /// Submits `picture`, `name`, `custom:occupation`, `custom:company`,
    /// `custom:age` and `custom:gender`.
    ///
    /// # Returns
    ///
    /// `true` only if every submitted attribute reports updated; a partial
    /// update answers `false`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self, picture, full_name, occupation, company), name = "update_attributes")]
    pub async fn update_attributes(
        &self,
        picture: &str,
        full_name: &str,
        occupation: &str,
        company: &str,
        age: u32,
        gender: i32,
    ) -> Result<bool> {
        self.ensure_open()?;
        let attributes = vec![
            UserAttribute::new(AttributeKey::Picture, picture),
            UserAttribute::new(AttributeKey::Name, full_name),
            UserAttribute::new(AttributeKey::custom(AttributeKey::OCCUPATION), occupation),
            UserAttribute::new(AttributeKey::custom(AttributeKey::COMPANY), company),
            UserAttribute::new(AttributeKey::custom(AttributeKey::AGE), age.to_string()),
            UserAttribute::new(AttributeKey::custom(AttributeKey::GENDER), gender.to_string()),
        ];
        let keys: Vec<AttributeKey> = attributes.iter().map(|a| a.key.clone()).collect();

        let results = self
            .identity
            .update_user_attributes(attributes)
            .await
            .map_err(wrap("update_attributes"))?;

        let all_updated = keys
            .iter()
            .all(|key| results.get(key).is_some_and(|result| result.is_updated));
        if !all_updated {
            let rejected: Vec<String> = keys
                .iter()
                .filter(|key| !results.get(*key).is_some_and(|result| result.is_updated))
                .map(ToString::to_string)
                .collect();
            tracing::warn!(?rejected, "Attribute batch partially applied");
        }
        Ok(all_updated)
    }

    /// Fetch every attribute of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self), name = "get_all_attributes")]
    pub async fn get_all_attributes(&self) -> Result<Vec<UserAttribute>> {
        self.ensure_open()?;
        let attributes = self
            .identity
            .fetch_user_attributes()
            .await
            .map_err(wrap("get_all_attributes"))?;
        for attribute in &attributes {
            tracing::debug!(key = %attribute.key, value = %attribute.value, "User attribute");
        }
        Ok(attributes)
    }

    /// Fetch every attribute and replace the stored record's profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    pub async fn fetch_attributes_into_user(&self) -> Result<User> {
        let attributes = self.get_all_attributes().await?;
        Ok(self.replace_user(|user| user.with_attributes(&attributes)))
    }

    // ═══════════════════════════════════════════════════════════
    // Storage
    // ═══════════════════════════════════════════════════════════

    /// Upload a file under the signed-in user's id with private access.
    ///
    /// The object carries `owner` and `description` metadata. Concurrent
    /// uploads are last-writer-wins.
    ///
    /// # Returns
    ///
    /// The storage key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if no user id is stored or the
    /// provider call fails.
    #[tracing::instrument(skip(self, file), fields(file = %file.as_ref().display()), name = "upload")]
    pub async fn upload(&self, file: impl AsRef<Path>) -> Result<String> {
        self.ensure_open()?;
        let owner = self.user().id;
        if owner.is_empty() {
            return Err(AuthError::Authentication {
                message: "No signed-in user to own the upload".to_string(),
            });
        }

        let request = UploadRequest {
            key: owner.clone(),
            local_path: file.as_ref().to_path_buf(),
            access_level: AccessLevel::Private,
            metadata: HashMap::from([
                (METADATA_OWNER.to_string(), owner),
                (
                    METADATA_DESCRIPTION.to_string(),
                    self.config.upload_description.clone(),
                ),
            ]),
        };
        let result = self
            .storage
            .upload_file(request)
            .await
            .map_err(wrap("upload"))?;
        tracing::info!(key = %result.key, "File uploaded");
        Ok(result.key)
    }

    /// Get a private, time-limited URL for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] if the provider call fails.
    #[tracing::instrument(skip(self), name = "get_url")]
    pub async fn get_url(&self, key: &str) -> Result<String> {
        self.ensure_open()?;
        let result = self
            .storage
            .get_url(key, AccessLevel::Private, self.config.url_expiry)
            .await
            .map_err(wrap("get_url"))?;
        Ok(result.url)
    }
}

impl<I, S> Drop for SessionCoordinator<I, S>
where
    I: IdentityProvider + 'static,
    S: StorageProvider + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}

impl<I, S> std::fmt::Debug for SessionCoordinator<I, S>
where
    I: IdentityProvider + 'static,
    S: StorageProvider + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("user", &self.user())
            .field("status", &self.status())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_translation_table() {
        for name in [names::SIGNED_OUT, names::SESSION_EXPIRED, names::USER_DELETED] {
            assert_eq!(
                translate_event(&HubEvent::new(name)),
                Some(AuthenticationStatus::Unauthenticated)
            );
        }
        assert_eq!(translate_event(&HubEvent::new(names::SIGNED_IN)), None);
        assert_eq!(translate_event(&HubEvent::new(names::TOKEN_REFRESH)), None);
    }

    proptest! {
        #[test]
        fn prop_unmapped_event_is_noop(name in "[a-zA-Z_-]{0,24}") {
            prop_assume!(
                name != names::SIGNED_OUT
                    && name != names::SESSION_EXPIRED
                    && name != names::USER_DELETED
            );
            prop_assert_eq!(translate_event(&HubEvent::new(name)), None);
        }
    }
}
