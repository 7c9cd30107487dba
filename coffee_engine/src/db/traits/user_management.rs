use crate::{
    api::errors::UserApiError,
    db_types::{NewUser, User, UserUpdate},
};

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Fails with [`UserApiError::EmailAlreadyExists`] if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, UserApiError>;

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, UserApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserApiError>;

    async fn fetch_users(&self) -> Result<Vec<User>, UserApiError>;

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, UserApiError>;

    /// Returns `false` if the user did not exist. Users with orders on record cannot be deleted.
    async fn delete_user(&self, id: i64) -> Result<bool, UserApiError>;
}
