//! `users.json` repository.

use stockroom_core::{User, types::user};

use super::{Collection, Repository, RepositoryError};

/// The user collection.
pub struct Users;

impl Collection for Users {
    const FILE_NAME: &'static str = "users.json";
    const KEY: &'static str = "users";
    type Item = User;
}

/// Repository for user accounts.
pub type UserRepository<'a> = Repository<'a, Users>;

impl Repository<'_, Users> {
    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the document cannot be read.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.get_all().await?;
        Ok(user::find(&users, username).cloned())
    }

    /// Append a new account.
    ///
    /// The caller must hold the store's write lock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    pub async fn create(&self, new_user: User) -> Result<(), RepositoryError> {
        let mut users = self.get_all().await?;
        if user::find(&users, &new_user.username).is_some() {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                new_user.username
            )));
        }
        users.push(new_user);
        self.persist(&users).await
    }
}
