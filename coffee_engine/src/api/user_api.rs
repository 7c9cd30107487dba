use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    api::errors::UserApiError,
    db::traits::UserManagement,
    db_types::{NewUser, Role, User, UserUpdate},
    helpers::{hash_password, verify_password},
};

/// A signup request, as submitted by a client. The password is still in the clear.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl Debug for NewUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUserRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"****")
            .field("role", &self.role)
            .finish()
    }
}

/// `UserApi` manages customers and administrators, and checks login credentials.
pub struct UserApi<B> {
    db: B,
}

impl<B> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi")
    }
}

impl<B> UserApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    pub async fn create_user(&self, req: NewUserRequest) -> Result<User, UserApiError> {
        let role = req.role.parse::<Role>().map_err(|_| UserApiError::InvalidRole)?;
        for (field, value) in [("first_name", &req.first_name), ("last_name", &req.last_name), ("email", &req.email)] {
            if value.trim().is_empty() {
                return Err(UserApiError::InvalidUser(format!("{field} is required")));
            }
        }
        if !req.email.contains('@') {
            return Err(UserApiError::InvalidUser(format!("{} is not a valid email address", req.email)));
        }
        if req.password.is_empty() {
            return Err(UserApiError::InvalidUser("password is required".into()));
        }
        let password_hash = hash_password(&req.password).map_err(|e| UserApiError::PasswordHashError(e.to_string()))?;
        let user = NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password_hash,
            role,
        };
        let user = self.db.insert_user(user).await?;
        info!("🔐️ New {} account #{} created for {}", user.role, user.id, user.email);
        Ok(user)
    }

    /// Checks an email and password pair. An unknown email and a wrong password fail identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserApiError> {
        let email = email.trim().to_lowercase();
        let user = self.db.fetch_user_by_email(&email).await?.ok_or_else(|| {
            debug!("🔐️ Login attempt for unknown email {email}");
            UserApiError::InvalidCredentials
        })?;
        if !verify_password(password, &user.password_hash) {
            debug!("🔐️ Wrong password for user #{}", user.id);
            return Err(UserApiError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn fetch_user(&self, id: i64) -> Result<User, UserApiError> {
        self.db.fetch_user(id).await?.ok_or(UserApiError::UserNotFound(id))
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>, UserApiError> {
        self.db.fetch_users().await
    }

    pub async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, UserApiError> {
        if update.first_name.trim().is_empty() || update.last_name.trim().is_empty() {
            return Err(UserApiError::InvalidUser("first_name and last_name are required".into()));
        }
        self.db.update_user(id, update).await?.ok_or(UserApiError::UserNotFound(id))
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), UserApiError> {
        if self.db.delete_user(id).await? {
            info!("🔐️ User #{id} deleted");
            Ok(())
        } else {
            Err(UserApiError::UserNotFound(id))
        }
    }
}
