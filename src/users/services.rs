use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    error::AppError,
    users::{
        password::PasswordHasher,
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User, UserChanges},
    },
};

pub const EMAIL_TAKEN: &str = "E-mail já cadastrado.";
pub const NOT_FOUND: &str = "Usuário não encontrado.";
pub const NOT_FOUND_FOR_UPDATE: &str = "Usuário não encontrado para atualizar.";
pub const NOT_FOUND_FOR_DELETE: &str = "Usuário não encontrado para exclusão.";
pub const DELETED: &str = "Usuário excluído com sucesso.";

/// Business rules for users. Sole owner of the store and the hasher.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn register(&self, name: String, email: String, password: String) -> Result<User, AppError> {
        if self.store.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }

        let password = self.hasher.hash(password).await?;

        // The unique index catches a concurrent registration that slipped past the check above.
        let user = self
            .store
            .create(NewUser { name, email, password })
            .await
            .map_err(conflict_on_duplicate)?;

        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.list().await?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User, AppError> {
        let id = parse_id(id)?;
        self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!(user_id = id, "user not found");
            AppError::NotFound(NOT_FOUND.into())
        })
    }

    /// Omitted fields keep their stored values; the hash changes only when a non-empty password is given.
    pub async fn update(
        &self,
        id: &str,
        name: Option<String>,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<User, AppError> {
        let id = parse_id(id)?;
        let not_found = || {
            warn!(user_id = id, "user not found for update");
            AppError::NotFound(NOT_FOUND_FOR_UPDATE.into())
        };

        if self.store.find_by_id(id).await?.is_none() {
            return Err(not_found());
        }

        let password = match password.filter(|p| !p.is_empty()) {
            Some(plain) => Some(self.hasher.hash(plain).await?),
            None => None,
        };

        let user = self
            .store
            .update(id, UserChanges { name, email, password })
            .await
            .map_err(conflict_on_duplicate)?
            .ok_or_else(not_found)?;

        info!(user_id = user.id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> Result<&'static str, AppError> {
        let id = parse_id(id)?;
        if !self.store.delete(id).await? {
            warn!(user_id = id, "user not found for delete");
            return Err(AppError::NotFound(NOT_FOUND_FOR_DELETE.into()));
        }
        info!(user_id = id, "user deleted");
        Ok(DELETED)
    }
}

/// Reads the leading integer of `raw`, ignoring anything after it ("12abc" is 12).
fn parse_id(raw: &str) -> Result<i32, AppError> {
    let s = raw.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    s[..sign_len + digits]
        .parse::<i32>()
        .with_context(|| format!("invalid user id {raw:?}"))
        .map_err(AppError::Internal)
}

fn conflict_on_duplicate(e: StoreError) -> AppError {
    match e {
        StoreError::DuplicateEmail => {
            warn!("email already registered (unique constraint)");
            AppError::Conflict(EMAIL_TAKEN.into())
        }
        StoreError::Other(e) => AppError::Internal(e),
    }
}
