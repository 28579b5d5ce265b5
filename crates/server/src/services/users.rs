//! User creation.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use catalog_core::{Email, UserRole};

use super::{CatalogError, FieldError};
use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Input for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub address: Option<String>,
}

impl CreateUserRequest {
    /// Check every field, returning the parsed email when all pass.
    ///
    /// # Errors
    ///
    /// Returns every failing field, not just the first.
    pub fn validate(&self) -> Result<Email, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::required("name"));
        }
        let email = Email::parse(&self.email)
            .map_err(|e| errors.push(FieldError::invalid("email", &e.to_string())))
            .ok();
        if self.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(FieldError::invalid(
                "password",
                &format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }
        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}

/// User operations.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create a user with an Argon2id-hashed password.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name, email, or password is unacceptable
    /// - `AlreadyExists` if the email is taken
    /// - `Storage` on store failure
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, CatalogError> {
        let email = request.validate().map_err(CatalogError::Validation)?;

        let password_hash = hash_password(&request.password)?;
        let new_user = NewUser {
            name: request.name.trim().to_owned(),
            email,
            password_hash,
            phone: request.phone,
            role: request.role,
            address: request.address,
        };

        let user = self.store.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                CatalogError::AlreadyExists("email already registered".to_owned())
            }
            other => CatalogError::storage("create user", other),
        })?;

        tracing::info!(user_id = %user.user_id, "user created");
        Ok(user)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &SecretString) -> Result<String, CatalogError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            CatalogError::PasswordHash
        })
}
