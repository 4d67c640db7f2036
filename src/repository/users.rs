use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
use crate::model::{
    validate_field, validate_username, ProfileUpdate, Role, SignupRequest, User,
};
use crate::storage::TableFile;

/// The users table (`users.txt`)
pub struct Users {
    table: TableFile<User>,
}

impl Users {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            table: TableFile::new(path),
        }
    }

    pub async fn load_all(&self) -> StoreResult<Vec<User>> {
        self.table.load_all().await
    }

    pub async fn find(&self, username: &str) -> StoreResult<User> {
        self.load_all()
            .await?
            .into_iter()
            .find(|user| user.username == username)
            .ok_or_else(|| StoreError::not_found(format!("user `{username}`")))
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        self.load_all()
            .await?
            .into_iter()
            .find(|user| user.email == email)
            .ok_or_else(|| StoreError::not_found(format!("user with email `{email}`")))
    }

    pub async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self
            .load_all()
            .await?
            .iter()
            .any(|user| user.username == username))
    }

    /// Plaintext credential check
    pub async fn authenticate(&self, username: &str, password: &str) -> StoreResult<User> {
        self.load_all()
            .await?
            .into_iter()
            .find(|user| user.username == username && user.password == password)
            .ok_or(StoreError::Unauthorized)
    }

    /// Registers a new account
    ///
    /// The very first account becomes the administrator; every later one is
    /// a customer.
    pub async fn create(&self, signup: SignupRequest) -> StoreResult<User> {
        validate_username(&signup.username)?;
        validate_field("password", &signup.password)?;
        validate_field("email", &signup.email)?;
        validate_optional("phone number", &signup.phone_number)?;
        validate_optional("first name", &signup.first_name)?;
        validate_optional("last name", &signup.last_name)?;

        let mut table = self.table.lock().await;
        let mut users = table.load().await?;

        if users
            .iter()
            .any(|user| user.username == signup.username || user.email == signup.email)
        {
            return Err(StoreError::Conflict(
                "Username or email already exists.".to_string(),
            ));
        }

        let user = User {
            role: if users.is_empty() {
                Role::Admin
            } else {
                Role::Customer
            },
            username: signup.username,
            password: signup.password,
            email: signup.email,
            phone_number: signup.phone_number,
            first_name: signup.first_name,
            last_name: signup.last_name,
        };
        users.push(user.clone());
        table.store(&users).await?;

        tracing::info!(username = %user.username, role = user.role.as_str(), "User signed up");
        Ok(user)
    }

    /// Field-level profile overwrite; empty or missing fields are kept
    pub async fn update_profile(&self, update: ProfileUpdate) -> StoreResult<User> {
        let new_username = non_empty(update.new_username);
        let new_password = non_empty(update.new_password);
        let email = non_empty(update.email);
        let phone_number = non_empty(update.phone_number);
        let first_name = non_empty(update.first_name);
        let last_name = non_empty(update.last_name);
        for (field, value) in [
            ("username", &new_username),
            ("password", &new_password),
            ("email", &email),
            ("phone number", &phone_number),
            ("first name", &first_name),
            ("last name", &last_name),
        ] {
            if let Some(value) = value {
                validate_field(field, value)?;
            }
        }
        if let Some(username) = &new_username {
            validate_username(username)?;
        }

        let mut table = self.table.lock().await;
        let mut users = table.load().await?;

        let index = users
            .iter()
            .position(|user| user.username == update.original_username)
            .ok_or_else(|| {
                StoreError::not_found(format!("user `{}`", update.original_username))
            })?;

        let others = || {
            users
                .iter()
                .enumerate()
                .filter(move |(other, _)| *other != index)
                .map(|(_, user)| user)
        };
        if let Some(wanted) = &new_username {
            if others().any(|user| &user.username == wanted) {
                return Err(StoreError::Conflict("Username already exists.".to_string()));
            }
        }
        if let Some(wanted) = &email {
            if others().any(|user| &user.email == wanted) {
                return Err(StoreError::Conflict("Email already exists.".to_string()));
            }
        }

        let user = &mut users[index];
        if let Some(value) = new_username {
            user.username = value;
        }
        if let Some(value) = new_password {
            user.password = value;
        }
        if let Some(value) = email {
            user.email = value;
        }
        if let Some(value) = phone_number {
            user.phone_number = value;
        }
        if let Some(value) = first_name {
            user.first_name = value;
        }
        if let Some(value) = last_name {
            user.last_name = value;
        }
        let updated = user.clone();

        table.store(&users).await?;
        Ok(updated)
    }

    /// Sets a new password on the account registered with `email`
    pub async fn reset_password(&self, email: &str, new_password: &str) -> StoreResult<()> {
        validate_field("password", new_password)?;

        let mut table = self.table.lock().await;
        let mut users = table.load().await?;

        let user = users
            .iter_mut()
            .find(|user| user.email == email)
            .ok_or_else(|| StoreError::not_found(format!("user with email `{email}`")))?;
        user.password = new_password.to_string();

        table.store(&users).await
    }

    /// Removes an account; the administrator cannot be removed
    pub async fn delete(&self, username: &str) -> StoreResult<()> {
        let mut table = self.table.lock().await;
        let mut users = table.load().await?;

        let index = users
            .iter()
            .position(|user| user.username == username)
            .ok_or_else(|| StoreError::not_found(format!("user `{username}`")))?;
        if users[index].is_admin() {
            return Err(StoreError::validation(
                "the administrator account cannot be deleted",
            ));
        }
        users.remove(index);

        table.store(&users).await
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn validate_optional(field: &str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        Ok(())
    } else {
        validate_field(field, value)
    }
}
