//! The user record held by the session coordinator.
//!
//! [`User`] is an immutable value. The coordinator never mutates a stored
//! user in place; it builds a replacement with [`User::copy_with`] and swaps
//! the whole value, so readers never observe a half-applied update.

use crate::attributes::{AttributeKey, UserAttribute};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity, profile and transient session credentials for one user.
///
/// An empty `id` means "no authenticated user"; see [`User::empty`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary identity. Empty when nobody is signed in.
    pub id: String,
    /// Phone number used as the sign-in username.
    pub phone_number: Option<String>,
    /// Profile photo URL.
    pub photo: Option<String>,
    /// Display name.
    pub full_name: Option<String>,
    /// Free-text occupation.
    pub occupation: Option<String>,
    /// Free-text company.
    pub company: Option<String>,
    /// Age in years.
    pub age: Option<u32>,
    /// Gender code as stored by the identity provider.
    pub gender: Option<i32>,
    /// Opaque bearer credential for the current session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Opaque storage-scope identifier for the current session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
}

impl User {
    /// The distinguished "no authenticated user" value.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a user carrying only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether this value represents "no authenticated user".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Build a new user from this one, replacing only the fields set in `patch`.
    ///
    /// ```
    /// use composable_identity_core::user::{User, UserPatch};
    ///
    /// let user = User::new("abc").copy_with(UserPatch::new().phone_number("+15550100"));
    /// assert_eq!(user.id, "abc");
    /// assert_eq!(user.phone_number.as_deref(), Some("+15550100"));
    /// ```
    #[must_use]
    pub fn copy_with(&self, patch: UserPatch) -> Self {
        Self {
            id: patch.id.unwrap_or_else(|| self.id.clone()),
            phone_number: patch.phone_number.or_else(|| self.phone_number.clone()),
            photo: patch.photo.or_else(|| self.photo.clone()),
            full_name: patch.full_name.or_else(|| self.full_name.clone()),
            occupation: patch.occupation.or_else(|| self.occupation.clone()),
            company: patch.company.or_else(|| self.company.clone()),
            age: patch.age.or(self.age),
            gender: patch.gender.or(self.gender),
            session_token: patch.session_token.or_else(|| self.session_token.clone()),
            identity_id: patch.identity_id.or_else(|| self.identity_id.clone()),
        }
    }

    /// Build a new user whose profile fields come from provider attributes.
    ///
    /// Unknown keys and unparseable numbers are skipped; fields without a
    /// matching attribute keep their current value.
    #[must_use]
    pub fn with_attributes(&self, attributes: &[UserAttribute]) -> Self {
        let mut patch = UserPatch::new();
        for attribute in attributes {
            let value = attribute.value.clone();
            patch = match &attribute.key {
                AttributeKey::Sub => patch.id(value),
                AttributeKey::PhoneNumber => patch.phone_number(value),
                AttributeKey::Picture => patch.photo(value),
                AttributeKey::Name => patch.full_name(value),
                AttributeKey::Custom(name) => match name.as_str() {
                    AttributeKey::OCCUPATION => patch.occupation(value),
                    AttributeKey::COMPANY => patch.company(value),
                    AttributeKey::AGE => match value.parse() {
                        Ok(age) => patch.age(age),
                        Err(_) => patch,
                    },
                    AttributeKey::GENDER => match value.parse() {
                        Ok(gender) => patch.gender(gender),
                        Err(_) => patch,
                    },
                    _ => patch,
                },
                AttributeKey::Email => patch,
            };
        }
        self.copy_with(patch)
    }
}

// Session credentials stay out of logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("phone_number", &self.phone_number)
            .field("photo", &self.photo)
            .field("full_name", &self.full_name)
            .field("occupation", &self.occupation)
            .field("company", &self.company)
            .field("age", &self.age)
            .field("gender", &self.gender)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("identity_id", &self.identity_id)
            .finish()
    }
}

/// Field overrides for [`User::copy_with`].
///
/// Unset fields are copied from the receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    id: Option<String>,
    phone_number: Option<String>,
    photo: Option<String>,
    full_name: Option<String>,
    occupation: Option<String>,
    company: Option<String>,
    age: Option<u32>,
    gender: Option<i32>,
    session_token: Option<String>,
    identity_id: Option<String>,
}

impl UserPatch {
    /// An empty patch; applying it yields an equal user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `id`.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Override `phone_number`.
    #[must_use]
    pub fn phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Override `photo`.
    #[must_use]
    pub fn photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    /// Override `full_name`.
    #[must_use]
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Override `occupation`.
    #[must_use]
    pub fn occupation(mut self, occupation: impl Into<String>) -> Self {
        self.occupation = Some(occupation.into());
        self
    }

    /// Override `company`.
    #[must_use]
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Override `age`.
    #[must_use]
    pub const fn age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Override `gender`.
    #[must_use]
    pub const fn gender(mut self, gender: i32) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Override `session_token`. `None` leaves the current token in place.
    #[must_use]
    pub fn session_token(mut self, session_token: Option<String>) -> Self {
        self.session_token = session_token;
        self
    }

    /// Override `identity_id`. `None` leaves the current id in place.
    #[must_use]
    pub fn identity_id(mut self, identity_id: Option<String>) -> Self {
        self.identity_id = identity_id;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_user_equals_only_itself() {
        assert_eq!(User::empty(), User::empty());
        assert!(User::empty().is_empty());
        assert_ne!(User::empty(), User::new("u-1"));
        assert!(!User::new("u-1").is_empty());
    }

    #[test]
    fn test_copy_with_session_credentials() {
        let user = User::new("u-1").copy_with(
            UserPatch::new()
                .session_token(Some("token".to_string()))
                .identity_id(Some("eu-west-1:abc".to_string())),
        );
        assert_eq!(user.session_token.as_deref(), Some("token"));
        assert_eq!(user.identity_id.as_deref(), Some("eu-west-1:abc"));

        // None keeps what was there
        let again = user.copy_with(UserPatch::new().session_token(None));
        assert_eq!(again.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_with_attributes_parses_profile() {
        let attributes = vec![
            UserAttribute::new(AttributeKey::Sub, "u-9"),
            UserAttribute::new(AttributeKey::Name, "Ada Lovelace"),
            UserAttribute::new(AttributeKey::Picture, "https://cdn.example.com/a.png"),
            UserAttribute::new(AttributeKey::custom(AttributeKey::OCCUPATION), "Engineer"),
            UserAttribute::new(AttributeKey::custom(AttributeKey::COMPANY), "Analytical"),
            UserAttribute::new(AttributeKey::custom(AttributeKey::AGE), "36"),
            UserAttribute::new(AttributeKey::custom(AttributeKey::GENDER), "not-a-number"),
            UserAttribute::new(AttributeKey::Email, ""),
        ];

        let user = User::new("u-1").with_attributes(&attributes);

        assert_eq!(user.id, "u-9");
        assert_eq!(user.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(user.photo.as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(user.occupation.as_deref(), Some("Engineer"));
        assert_eq!(user.company.as_deref(), Some("Analytical"));
        assert_eq!(user.age, Some(36));
        assert_eq!(user.gender, None);
    }

    #[test]
    fn test_debug_redacts_session_token() {
        let user = User::new("u-1").copy_with(UserPatch::new().session_token(Some("secret".into())));
        let rendered = format!("{user:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let user = User::new("u-1").copy_with(UserPatch::new().full_name("Ada"));
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["fullName"], "Ada");
        assert!(json.get("sessionToken").is_none());
    }

    fn arb_user() -> impl Strategy<Value = User> {
        (
            "[a-z0-9-]{0,12}",
            proptest::option::of("\\+[0-9]{6,12}"),
            proptest::option::of("[A-Za-z ]{1,20}"),
            proptest::option::of(0u32..120),
            proptest::option::of(0i32..4),
        )
            .prop_map(|(id, phone_number, full_name, age, gender)| User {
                id,
                phone_number,
                full_name,
                age,
                gender,
                ..User::default()
            })
    }

    proptest! {
        #[test]
        fn prop_empty_patch_is_identity(user in arb_user()) {
            prop_assert_eq!(user.copy_with(UserPatch::new()), user);
        }

        #[test]
        fn prop_id_patch_changes_only_id(user in arb_user(), id in "[a-z]{1,8}") {
            let updated = user.copy_with(UserPatch::new().id(id.clone()));
            prop_assert_eq!(&updated.id, &id);
            prop_assert_eq!(User { id: user.id.clone(), ..updated }, user);
        }

        #[test]
        fn prop_non_empty_id_differs_from_empty(id in "[a-z0-9]{1,12}") {
            prop_assert_ne!(User::new(id), User::empty());
        }
    }
}
