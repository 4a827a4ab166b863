//! User Service - account lifecycle and the change-password workflow

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{ChangePassword, CreateUser, NewUser, UpdateUser, User, UserResponse};
use crate::password::{Argon2Hasher, PasswordHasher};
use crate::repository::UserRepository;

/// Every mutation reads the current record, checks its preconditions, then writes once.
/// A failed precondition means no write happens.
pub struct UserService<R: UserRepository, H: PasswordHasher = Argon2Hasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    pub fn new(repository: R, hasher: H) -> Self {
        Self {
            repository: Arc::new(repository),
            hasher: Arc::new(hasher),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// `None` when no user has this id
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> UserResult<Option<UserResponse>> {
        let user = self.repository.get_by_id(id).await?;
        Ok(user.map(UserResponse::from))
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<Uuid> {
        if input.password != input.password_confirm {
            return Err(UserError::ConfirmationMismatch);
        }

        let password_hash = self.hash(input.password).await?;
        let user = self
            .repository
            .create(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user.id)
    }

    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> UserResult<()> {
        self.require_user(id).await?;

        if !self.repository.update_profile(id, input).await? {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        self.require_user(id).await?;

        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Replace the password after proving knowledge of the current one.
    ///
    /// Checks run in order: user exists, old password verifies, confirmation matches.
    /// The new digest is only computed once all three pass.
    #[instrument(skip(self, input))]
    pub async fn change_password(&self, id: Uuid, input: ChangePassword) -> UserResult<()> {
        let user = self.require_user(id).await?;

        if !self.verify(input.old_password, user.password_hash).await? {
            tracing::warn!(user_id = %id, "Password change rejected: old password mismatch");
            return Err(UserError::InvalidCredential);
        }

        if input.new_password != input.confirm_new_password {
            return Err(UserError::ConfirmationMismatch);
        }

        let password_hash = self.hash(input.new_password).await?;
        if !self
            .repository
            .update_password_hash(id, password_hash)
            .await?
        {
            return Err(UserError::NotFound(id));
        }

        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    async fn require_user(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn hash(&self, plaintext: String) -> UserResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| UserError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify(&self, plaintext: String, digest: String) -> UserResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|e| UserError::Internal(format!("verification task failed: {e}")))?
    }
}

impl<R: UserRepository, H: PasswordHasher> Clone for UserService<R, H> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::password::{HasherConfig, MockPasswordHasher};
    use crate::repository::{InMemoryUserRepository, MockUserRepository};

    fn stored_user(id: Uuid, digest: &str) -> User {
        let mut user = User::new(NewUser {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password_hash: digest.to_string(),
        });
        user.id = id;
        user
    }

    fn create_input(password: &str, confirm: &str) -> CreateUser {
        CreateUser {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
        }
    }

    fn change_input(old: &str, new: &str, confirm: &str) -> ChangePassword {
        ChangePassword {
            old_password: old.to_string(),
            new_password: new.to_string(),
            confirm_new_password: confirm.to_string(),
        }
    }

    fn cheap_hasher() -> Argon2Hasher {
        Argon2Hasher::new(HasherConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_user_hashes_before_persisting() {
        let mut repo = MockUserRepository::new();
        let mut hasher = MockPasswordHasher::new();

        hasher
            .expect_hash()
            .withf(|plaintext| plaintext == "secret1")
            .times(1)
            .returning(|_| Ok("$argon2id$digest".to_string()));
        repo.expect_create()
            .withf(|input| input.password_hash == "$argon2id$digest" && input.name == "Ann")
            .times(1)
            .returning(|input| Ok(User::new(input)));

        let service = UserService::new(repo, hasher);
        let id = service.create_user(create_input("secret1", "secret1")).await;

        assert!(id.is_ok());
    }

    #[tokio::test]
    async fn test_create_user_mismatch_skips_hashing_and_store() {
        let mut repo = MockUserRepository::new();
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().times(0);
        repo.expect_create().times(0);

        let service = UserService::new(repo, hasher);
        let result = service.create_user(create_input("secret1", "secret2")).await;

        assert!(matches!(result, Err(UserError::ConfirmationMismatch)));
    }

    #[tokio::test]
    async fn test_create_user_propagates_store_rejection() {
        let mut repo = MockUserRepository::new();
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Ok("$argon2id$digest".to_string()));
        repo.expect_create()
            .times(1)
            .returning(|input| Err(StoreError::DuplicateEmail(input.email)));

        let service = UserService::new(repo, hasher);
        let result = service.create_user(create_input("secret1", "secret1")).await;

        assert!(matches!(
            result,
            Err(UserError::Persistence(StoreError::DuplicateEmail(_)))
        ));
    }

    #[tokio::test]
    async fn test_get_user_missing_is_none() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = UserService::new(repo, MockPasswordHasher::new());
        let user = service.get_user(Uuid::now_v7()).await.unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_get_users_empty_is_ok() {
        let mut repo = MockUserRepository::new();
        repo.expect_list().times(1).returning(|| Ok(vec![]));

        let service = UserService::new(repo, MockPasswordHasher::new());
        assert!(service.get_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_user_missing_skips_write() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));
        repo.expect_update_profile().times(0);

        let service = UserService::new(repo, MockPasswordHasher::new());
        let id = Uuid::now_v7();
        let input = UpdateUser {
            name: "Annie".to_string(),
            email: "annie@example.com".to_string(),
        };

        let result = service.update_user(id, input).await;
        assert!(matches!(result, Err(UserError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_delete_user_vanished_between_read_and_write() {
        let id = Uuid::now_v7();
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "$argon2id$digest"))));
        repo.expect_delete().times(1).returning(|_| Ok(false));

        let service = UserService::new(repo, MockPasswordHasher::new());
        let result = service.delete_user(id).await;

        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let mut repo = MockUserRepository::new();
        let mut hasher = MockPasswordHasher::new();
        repo.expect_get_by_id().returning(|_| Ok(None));
        hasher.expect_verify().times(0);
        hasher.expect_hash().times(0);

        let service = UserService::new(repo, hasher);
        let result = service
            .change_password(Uuid::now_v7(), change_input("secret1", "secret2", "secret2"))
            .await;

        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_change_password_wrong_old_password_leaves_digest() {
        let mut repo = MockUserRepository::new();
        let mut hasher = MockPasswordHasher::new();
        repo.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "$argon2id$digest"))));
        repo.expect_update_password_hash().times(0);
        hasher.expect_verify().times(1).returning(|_, _| Ok(false));
        hasher.expect_hash().times(0);

        let service = UserService::new(repo, hasher);
        let result = service
            .change_password(Uuid::now_v7(), change_input("wrong1", "secret2", "secret2"))
            .await;

        assert!(matches!(result, Err(UserError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_change_password_mismatch_checked_after_credential_before_hash() {
        let mut repo = MockUserRepository::new();
        let mut hasher = MockPasswordHasher::new();
        repo.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "$argon2id$digest"))));
        repo.expect_update_password_hash().times(0);
        hasher
            .expect_verify()
            .withf(|plaintext, digest| plaintext == "secret1" && digest == "$argon2id$digest")
            .times(1)
            .returning(|_, _| Ok(true));
        hasher.expect_hash().times(0);

        let service = UserService::new(repo, hasher);
        let result = service
            .change_password(Uuid::now_v7(), change_input("secret1", "secret2", "secret3"))
            .await;

        assert!(matches!(result, Err(UserError::ConfirmationMismatch)));
    }

    #[tokio::test]
    async fn test_change_password_writes_new_digest_once() {
        let mut repo = MockUserRepository::new();
        let mut hasher = MockPasswordHasher::new();
        repo.expect_get_by_id()
            .returning(|id| Ok(Some(stored_user(id, "$argon2id$old"))));
        repo.expect_update_password_hash()
            .withf(|_, digest| digest == "$argon2id$new")
            .times(1)
            .returning(|_, _| Ok(true));
        hasher.expect_verify().times(1).returning(|_, _| Ok(true));
        hasher
            .expect_hash()
            .withf(|plaintext| plaintext == "secret2")
            .times(1)
            .returning(|_| Ok("$argon2id$new".to_string()));

        let service = UserService::new(repo, hasher);
        let result = service
            .change_password(Uuid::now_v7(), change_input("secret1", "secret2", "secret2"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_end_to_end_with_argon2() {
        let hasher = cheap_hasher();
        let service = UserService::new(InMemoryUserRepository::new(), hasher.clone());

        let id = service
            .create_user(create_input("secret1", "secret1"))
            .await
            .unwrap();
        service
            .change_password(id, change_input("secret1", "secret2", "secret2"))
            .await
            .unwrap();

        let stored = service.repository.get_by_id(id).await.unwrap().unwrap();
        assert!(hasher.verify("secret2", &stored.password_hash).unwrap());
        assert!(!hasher.verify("secret1", &stored.password_hash).unwrap());

        // The old password no longer works for a second change
        let again = service
            .change_password(id, change_input("secret1", "secret3", "secret3"))
            .await;
        assert!(matches!(again, Err(UserError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_create_get_delete_lifecycle() {
        let service = UserService::new(InMemoryUserRepository::new(), cheap_hasher());

        let id = service
            .create_user(create_input("secret1", "secret1"))
            .await
            .unwrap();
        let user = service.get_user(id).await.unwrap().unwrap();
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "ann@example.com");

        service.delete_user(id).await.unwrap();
        assert!(service.get_user(id).await.unwrap().is_none());
        assert!(matches!(
            service.delete_user(id).await,
            Err(UserError::NotFound(_))
        ));
    }
}
