//! In-memory identity provider.

use super::hub::HubEventSource;
use composable_identity_core::attributes::{AttributeKey, UpdateAttributeResult, UserAttribute};
use composable_identity_core::error::ProviderError;
use composable_identity_core::events::{HubEventStream, names};
use composable_identity_core::providers::{
    AuthSession, AuthUser, FetchSessionOptions, IdentityProvider, ProviderResult,
    ResetPasswordOutcome, SignInOutcome, SignOutOptions, SignUpOutcome, SignUpRequest,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Confirmation code the mock accepts unless changed with
/// [`MockIdentityProvider::set_confirmation_code`].
pub const DEFAULT_CONFIRMATION_CODE: &str = "123456";

/// Identity operations, used to inject failures and inspect calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityOperation {
    /// `current_user`
    CurrentUser,
    /// `fetch_auth_session`
    FetchAuthSession,
    /// `sign_out`
    SignOut,
    /// `delete_user`
    DeleteUser,
    /// `sign_up`
    SignUp,
    /// `confirm_sign_up`
    ConfirmSignUp,
    /// `resend_sign_up_code`
    ResendSignUpCode,
    /// `sign_in`
    SignIn,
    /// `confirm_sign_in`
    ConfirmSignIn,
    /// `reset_password`
    ResetPassword,
    /// `confirm_reset_password`
    ConfirmResetPassword,
    /// `update_password`
    UpdatePassword,
    /// `fetch_user_attributes`
    FetchUserAttributes,
    /// `update_user_attributes`
    UpdateUserAttributes,
}

/// One recorded call with the arguments the provider received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCall {
    /// `current_user()`
    CurrentUser,
    /// `fetch_auth_session(options)`
    FetchAuthSession(FetchSessionOptions),
    /// `sign_out(options)`
    SignOut(SignOutOptions),
    /// `delete_user()`
    DeleteUser,
    /// `sign_up(request)`
    SignUp(SignUpRequest),
    /// `confirm_sign_up(username, code)`
    ConfirmSignUp {
        /// Username
        username: String,
        /// Code
        code: String,
    },
    /// `resend_sign_up_code(username)`
    ResendSignUpCode(String),
    /// `sign_in(username, password)`
    SignIn {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// `confirm_sign_in(code)`
    ConfirmSignIn(String),
    /// `reset_password(username)`
    ResetPassword(String),
    /// `confirm_reset_password(username, new_password, code)`
    ConfirmResetPassword {
        /// Username
        username: String,
        /// New password
        new_password: String,
        /// Code
        code: String,
    },
    /// `update_password(old, new)`
    UpdatePassword {
        /// Old password
        old_password: String,
        /// New password
        new_password: String,
    },
    /// `fetch_user_attributes()`
    FetchUserAttributes,
    /// `update_user_attributes(attributes)`
    UpdateUserAttributes(Vec<UserAttribute>),
}

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
    confirmed: bool,
    attributes: Vec<UserAttribute>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    signed_in: Option<String>,
    pending_challenge: Option<String>,
    require_sign_in_challenge: bool,
    confirmation_code: String,
    next_user: u64,
    rejected_attributes: HashSet<AttributeKey>,
    failures: HashMap<IdentityOperation, ProviderError>,
    calls: Vec<IdentityCall>,
}

/// Mock identity provider.
///
/// Keeps accounts in memory and behaves like a small identity service:
/// sign-up needs confirmation with a code, sign-in checks the password,
/// and sign-in, sign-out and account deletion publish the matching raw
/// events on [`hub`](Self::hub).
///
/// Every call is recorded; any operation can be made to fail with
/// [`fail`](Self::fail).
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    state: Arc<Mutex<State>>,
    hub: HubEventSource,
}

impl MockIdentityProvider {
    /// Create a mock with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                confirmation_code: DEFAULT_CONFIRMATION_CODE.to_string(),
                ..State::default()
            })),
            hub: HubEventSource::new(),
        }
    }

    /// Create a mock with one confirmed account, already signed in.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn with_signed_in_user(user_id: &str, phone_number: &str) -> Self {
        let mock = Self::new();
        {
            let mut state = mock.state.lock().unwrap();
            state.accounts.insert(
                phone_number.to_string(),
                Account {
                    user_id: user_id.to_string(),
                    password: String::new(),
                    confirmed: true,
                    attributes: vec![UserAttribute::new(AttributeKey::PhoneNumber, phone_number)],
                },
            );
            state.signed_in = Some(phone_number.to_string());
        }
        mock
    }

    #[allow(clippy::unwrap_used)]
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// The raw event channel this provider publishes on.
    #[must_use]
    pub const fn hub(&self) -> &HubEventSource {
        &self.hub
    }

    /// Make `operation` fail with `message` until [`clear_failure`](Self::clear_failure).
    pub fn fail(&self, operation: IdentityOperation, message: &str) {
        self.state()
            .failures
            .insert(operation, ProviderError::service(message));
    }

    /// Stop failing `operation`.
    pub fn clear_failure(&self, operation: IdentityOperation) {
        self.state().failures.remove(&operation);
    }

    /// Report `is_updated = false` for `key` in attribute batches.
    pub fn reject_attribute(&self, key: AttributeKey) {
        self.state().rejected_attributes.insert(key);
    }

    /// Require a second factor after the password check.
    pub fn require_sign_in_challenge(&self, required: bool) {
        self.state().require_sign_in_challenge = required;
    }

    /// Change the code accepted for confirmations and challenges.
    pub fn set_confirmation_code(&self, code: &str) {
        self.state().confirmation_code = code.to_string();
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<IdentityCall> {
        self.state().calls.clone()
    }

    /// Username of the signed-in account, if any.
    #[must_use]
    pub fn signed_in_username(&self) -> Option<String> {
        self.state().signed_in.clone()
    }

    /// Whether an account exists for `username`.
    #[must_use]
    pub fn has_account(&self, username: &str) -> bool {
        self.state().accounts.contains_key(username)
    }

    /// Record `call` and return the injected failure for `operation`, if any.
    fn begin(&self, operation: IdentityOperation, call: IdentityCall) -> ProviderResult<()> {
        let mut state = self.state();
        state.calls.push(call);
        state.failures.get(&operation).cloned().map_or(Ok(()), Err)
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn not_signed_in() -> ProviderError {
    ProviderError::service("User is not signed in.")
}

fn no_account(username: &str) -> ProviderError {
    ProviderError::service(format!("User {username} does not exist."))
}

fn wrong_code() -> ProviderError {
    ProviderError::service("Invalid verification code provided, please try again.")
}

impl IdentityProvider for MockIdentityProvider {
    fn current_user(&self) -> impl Future<Output = ProviderResult<AuthUser>> + Send {
        let result = self
            .begin(IdentityOperation::CurrentUser, IdentityCall::CurrentUser)
            .and_then(|()| {
                let state = self.state();
                let username = state.signed_in.clone().ok_or_else(not_signed_in)?;
                let account = state
                    .accounts
                    .get(&username)
                    .ok_or_else(|| no_account(&username))?;
                Ok(AuthUser {
                    user_id: account.user_id.clone(),
                    username,
                })
            });
        async move { result }
    }

    fn fetch_auth_session(
        &self,
        options: FetchSessionOptions,
    ) -> impl Future<Output = ProviderResult<AuthSession>> + Send {
        let result = self
            .begin(
                IdentityOperation::FetchAuthSession,
                IdentityCall::FetchAuthSession(options),
            )
            .map(|()| {
                let state = self.state();
                let user_id = state
                    .signed_in
                    .as_ref()
                    .and_then(|username| state.accounts.get(username))
                    .map(|account| account.user_id.clone());
                match user_id {
                    Some(user_id) if options.include_credentials => AuthSession {
                        is_signed_in: true,
                        id_token: Some(format!("id-token-{user_id}")),
                        identity_id: Some(format!("test-region:{user_id}")),
                    },
                    Some(_) => AuthSession {
                        is_signed_in: true,
                        ..AuthSession::default()
                    },
                    None => AuthSession::default(),
                }
            });
        async move { result }
    }

    fn sign_out(&self, options: SignOutOptions) -> impl Future<Output = ProviderResult<()>> + Send {
        let result = self
            .begin(IdentityOperation::SignOut, IdentityCall::SignOut(options))
            .map(|()| {
                self.state().signed_in = None;
                self.hub.publish(names::SIGNED_OUT);
            });
        async move { result }
    }

    fn delete_user(&self) -> impl Future<Output = ProviderResult<()>> + Send {
        let result = self
            .begin(IdentityOperation::DeleteUser, IdentityCall::DeleteUser)
            .and_then(|()| {
                let mut state = self.state();
                let username = state.signed_in.take().ok_or_else(not_signed_in)?;
                state.accounts.remove(&username);
                drop(state);
                self.hub.publish(names::USER_DELETED);
                Ok(())
            });
        async move { result }
    }

    fn sign_up(
        &self,
        request: SignUpRequest,
    ) -> impl Future<Output = ProviderResult<SignUpOutcome>> + Send {
        let result = self
            .begin(IdentityOperation::SignUp, IdentityCall::SignUp(request.clone()))
            .and_then(|()| {
                let mut state = self.state();
                if state.accounts.contains_key(&request.username) {
                    return Err(ProviderError::service("User already exists"));
                }
                if request.password.len() < 8 {
                    return Err(ProviderError::service(
                        "Password did not conform with policy: Password not long enough",
                    ));
                }
                state.next_user += 1;
                let user_id = format!("user-{}", state.next_user);
                state.accounts.insert(
                    request.username,
                    Account {
                        user_id,
                        password: request.password,
                        confirmed: false,
                        attributes: request.attributes,
                    },
                );
                Ok(SignUpOutcome {
                    is_sign_up_complete: false,
                })
            });
        async move { result }
    }

    fn confirm_sign_up(
        &self,
        username: &str,
        code: &str,
    ) -> impl Future<Output = ProviderResult<SignUpOutcome>> + Send {
        let result = self
            .begin(
                IdentityOperation::ConfirmSignUp,
                IdentityCall::ConfirmSignUp {
                    username: username.to_string(),
                    code: code.to_string(),
                },
            )
            .and_then(|()| {
                let mut state = self.state();
                if code != state.confirmation_code {
                    return Err(wrong_code());
                }
                let account = state
                    .accounts
                    .get_mut(username)
                    .ok_or_else(|| no_account(username))?;
                account.confirmed = true;
                Ok(SignUpOutcome {
                    is_sign_up_complete: true,
                })
            });
        async move { result }
    }

    fn resend_sign_up_code(
        &self,
        username: &str,
    ) -> impl Future<Output = ProviderResult<()>> + Send {
        let result = self
            .begin(
                IdentityOperation::ResendSignUpCode,
                IdentityCall::ResendSignUpCode(username.to_string()),
            )
            .and_then(|()| {
                if self.has_account(username) {
                    Ok(())
                } else {
                    Err(no_account(username))
                }
            });
        async move { result }
    }

    fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = ProviderResult<SignInOutcome>> + Send {
        let result = self
            .begin(
                IdentityOperation::SignIn,
                IdentityCall::SignIn {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )
            .and_then(|()| {
                let mut state = self.state();
                let account = state
                    .accounts
                    .get(username)
                    .ok_or_else(|| no_account(username))?;
                if account.password != password {
                    return Err(ProviderError::service("Incorrect username or password."));
                }
                if !account.confirmed {
                    return Err(ProviderError::service("User is not confirmed."));
                }
                if state.require_sign_in_challenge {
                    state.pending_challenge = Some(username.to_string());
                    return Ok(SignInOutcome {
                        is_signed_in: false,
                    });
                }
                state.signed_in = Some(username.to_string());
                drop(state);
                self.hub.publish(names::SIGNED_IN);
                Ok(SignInOutcome { is_signed_in: true })
            });
        async move { result }
    }

    fn confirm_sign_in(
        &self,
        code: &str,
    ) -> impl Future<Output = ProviderResult<SignInOutcome>> + Send {
        let result = self
            .begin(
                IdentityOperation::ConfirmSignIn,
                IdentityCall::ConfirmSignIn(code.to_string()),
            )
            .and_then(|()| {
                let mut state = self.state();
                if code != state.confirmation_code {
                    return Err(wrong_code());
                }
                let username = state
                    .pending_challenge
                    .take()
                    .ok_or_else(|| ProviderError::service("No sign-in challenge is pending."))?;
                state.signed_in = Some(username);
                drop(state);
                self.hub.publish(names::SIGNED_IN);
                Ok(SignInOutcome { is_signed_in: true })
            });
        async move { result }
    }

    fn reset_password(
        &self,
        username: &str,
    ) -> impl Future<Output = ProviderResult<ResetPasswordOutcome>> + Send {
        let result = self
            .begin(
                IdentityOperation::ResetPassword,
                IdentityCall::ResetPassword(username.to_string()),
            )
            .and_then(|()| {
                if self.has_account(username) {
                    Ok(ResetPasswordOutcome {
                        is_password_reset: false,
                    })
                } else {
                    Err(no_account(username))
                }
            });
        async move { result }
    }

    fn confirm_reset_password(
        &self,
        username: &str,
        new_password: &str,
        code: &str,
    ) -> impl Future<Output = ProviderResult<()>> + Send {
        let result = self
            .begin(
                IdentityOperation::ConfirmResetPassword,
                IdentityCall::ConfirmResetPassword {
                    username: username.to_string(),
                    new_password: new_password.to_string(),
                    code: code.to_string(),
                },
            )
            .and_then(|()| {
                let mut state = self.state();
                if code != state.confirmation_code {
                    return Err(wrong_code());
                }
                let account = state
                    .accounts
                    .get_mut(username)
                    .ok_or_else(|| no_account(username))?;
                account.password = new_password.to_string();
                Ok(())
            });
        async move { result }
    }

    fn update_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> impl Future<Output = ProviderResult<()>> + Send {
        let result = self
            .begin(
                IdentityOperation::UpdatePassword,
                IdentityCall::UpdatePassword {
                    old_password: old_password.to_string(),
                    new_password: new_password.to_string(),
                },
            )
            .and_then(|()| {
                let mut state = self.state();
                let username = state.signed_in.clone().ok_or_else(not_signed_in)?;
                let account = state
                    .accounts
                    .get_mut(&username)
                    .ok_or_else(|| no_account(&username))?;
                if account.password != old_password {
                    return Err(ProviderError::service("Incorrect username or password."));
                }
                account.password = new_password.to_string();
                Ok(())
            });
        async move { result }
    }

    fn fetch_user_attributes(
        &self,
    ) -> impl Future<Output = ProviderResult<Vec<UserAttribute>>> + Send {
        let result = self
            .begin(
                IdentityOperation::FetchUserAttributes,
                IdentityCall::FetchUserAttributes,
            )
            .and_then(|()| {
                let state = self.state();
                let username = state.signed_in.clone().ok_or_else(not_signed_in)?;
                let account = state
                    .accounts
                    .get(&username)
                    .ok_or_else(|| no_account(&username))?;
                let mut attributes = vec![UserAttribute::new(
                    AttributeKey::Sub,
                    account.user_id.clone(),
                )];
                attributes.extend(account.attributes.iter().cloned());
                Ok(attributes)
            });
        async move { result }
    }

    fn update_user_attributes(
        &self,
        attributes: Vec<UserAttribute>,
    ) -> impl Future<Output = ProviderResult<HashMap<AttributeKey, UpdateAttributeResult>>> + Send
    {
        let result = self
            .begin(
                IdentityOperation::UpdateUserAttributes,
                IdentityCall::UpdateUserAttributes(attributes.clone()),
            )
            .and_then(|()| {
                let mut state = self.state();
                let username = state.signed_in.clone().ok_or_else(not_signed_in)?;
                let rejected = state.rejected_attributes.clone();
                let account = state
                    .accounts
                    .get_mut(&username)
                    .ok_or_else(|| no_account(&username))?;

                let mut results = HashMap::new();
                for attribute in attributes {
                    let is_updated = !rejected.contains(&attribute.key);
                    if is_updated {
                        account.attributes.retain(|a| a.key != attribute.key);
                        account.attributes.push(attribute.clone());
                    }
                    results.insert(attribute.key, UpdateAttributeResult { is_updated });
                }
                Ok(results)
            });
        async move { result }
    }

    fn hub_events(&self) -> HubEventStream {
        self.hub.stream()
    }
}
