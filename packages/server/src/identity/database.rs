use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::*;
use tracing::instrument;

use super::{
    Identity, IdentityError, IdentityPage, IdentityProvider, IdentityRecord, IssuedToken,
    NewIdentity,
};
use crate::entity::account;
use crate::utils::{hash, jwt};

/// Minimum password length accepted for new identities.
const MIN_PASSWORD_LEN: usize = 6;

/// Identity provider over the `account` table with HS256 bearer tokens.
#[derive(Clone)]
pub struct DbIdentityProvider {
    db: DatabaseConnection,
    jwt_secret: String,
    token_ttl: Duration,
}

impl DbIdentityProvider {
    pub fn new(db: DatabaseConnection, jwt_secret: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            db,
            jwt_secret: jwt_secret.into(),
            token_ttl,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<account::Model>, IdentityError> {
        Ok(account::Entity::find()
            .filter(account::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    async fn find_by_uid(&self, uid: &str) -> Result<account::Model, IdentityError> {
        account::Entity::find_by_id(uid.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| IdentityError::NotFound(uid.to_string()))
    }
}

impl From<account::Model> for IdentityRecord {
    fn from(m: account::Model) -> Self {
        Self {
            uid: m.uid,
            email: m.email,
            display_name: m.display_name,
            phone_number: m.phone_number,
            is_admin: m.is_admin,
            created_at: m.created_at,
        }
    }
}

#[async_trait]
impl IdentityProvider for DbIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Identity, IdentityError> {
        let claims =
            jwt::verify(token, &self.jwt_secret).map_err(|_| IdentityError::InvalidToken)?;
        Ok(Identity {
            uid: claims.sub,
            email: claims.email,
            is_admin: claims.is_admin,
        })
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedToken, IdentityError> {
        let account = self
            .find_by_email(email.trim())
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let is_valid = hash::verify_password(password, &account.password_hash)
            .map_err(|e| IdentityError::Internal(format!("Password verify error: {e}")))?;
        if !is_valid {
            return Err(IdentityError::InvalidCredentials);
        }

        let (token, expires_at) = jwt::sign(
            &account.uid,
            &account.email,
            account.is_admin,
            self.token_ttl,
            &self.jwt_secret,
        )
        .map_err(|e| IdentityError::Internal(format!("JWT sign error: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at,
            identity: Identity {
                uid: account.uid,
                email: account.email,
                is_admin: account.is_admin,
            },
        })
    }

    #[instrument(skip(self, new), fields(email = %new.email))]
    async fn create_user(&self, new: NewIdentity) -> Result<IdentityRecord, IdentityError> {
        let email = new.email.trim().to_string();
        if email.is_empty() {
            return Err(IdentityError::InvalidInput(
                "Identifier must not be empty".into(),
            ));
        }
        if new.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::AlreadyExists(email));
        }

        let password_hash = hash::hash_password(&new.password)
            .map_err(|e| IdentityError::Internal(format!("Password hash error: {e}")))?;

        let model = account::ActiveModel {
            uid: Set(uuid::Uuid::now_v7().simple().to_string()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            display_name: Set(new.display_name),
            phone_number: Set(new.phone_number),
            is_admin: Set(false),
            created_at: Set(Utc::now()),
        };

        let account = model.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => IdentityError::AlreadyExists(email),
            _ => IdentityError::from(e),
        })?;

        Ok(account.into())
    }

    async fn get_user(&self, uid: &str) -> Result<Option<IdentityRecord>, IdentityError> {
        Ok(account::Entity::find_by_id(uid.to_string())
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn list_users(
        &self,
        page_size: u64,
        page_token: Option<String>,
    ) -> Result<IdentityPage, IdentityError> {
        let page_size = std::cmp::Ord::max(page_size, 1);
        let mut query = account::Entity::find().order_by_asc(account::Column::Uid);
        if let Some(after) = page_token {
            query = query.filter(account::Column::Uid.gt(after));
        }

        let users: Vec<IdentityRecord> = query
            .limit(page_size)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let next_page_token = if users.len() as u64 == page_size {
            users.last().map(|u| u.uid.clone())
        } else {
            None
        };

        Ok(IdentityPage {
            users,
            next_page_token,
        })
    }

    #[instrument(skip(self))]
    async fn set_admin_claim(&self, uid: &str, is_admin: bool) -> Result<(), IdentityError> {
        let account = self.find_by_uid(uid).await?;
        let mut active: account::ActiveModel = account.into();
        active.is_admin = Set(is_admin);
        active.update(&self.db).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let account = self.find_by_uid(uid).await?;
        let mut active: account::ActiveModel = account.into();
        active.display_name = Set(Some(display_name.to_string()));
        active.update(&self.db).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, uid: &str) -> Result<bool, IdentityError> {
        let result = account::Entity::delete_by_id(uid.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
