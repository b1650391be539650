use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{ObjectStore, PutOptions};
use sea_orm::*;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::entity::user_profile;
use crate::error::AppError;
use crate::extractors::auth::{AuthUser, Role};
use crate::identity::{IdentityProvider, IdentityRecord, NewIdentity};
use crate::models::admin::{
    BulkCreateResult, BulkCreateUsersRequest, BulkCreateUsersResponse, BulkUserEntry,
    DEFAULT_PROFILE_PIC, PurgeUsersRequest, PurgeUsersResponse, SetClaimRequest,
    UpdateDisplayNameRequest, UserRecord, validate_display_name, validate_set_claim,
};
use crate::utils::filename::profile_picture_key;
use crate::utils::image::is_webp;

/// Identities are enumerated this many at a time.
const LIST_PAGE_SIZE: u64 = 1000;
const PROFILE_PIC_PREFIX: &str = "profilepics/";

/// User administration: admin claims, bulk import, purge, listings and
/// profile maintenance.
pub struct AdminService {
    db: DatabaseConnection,
    store: Arc<dyn ObjectStore>,
    identity: Arc<dyn IdentityProvider>,
    signed_url_ttl: Duration,
}

impl AdminService {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            db,
            store,
            identity,
            signed_url_ttl,
        }
    }

    /// Grant or revoke the admin claim. Takes effect on the target's next
    /// login.
    #[instrument(skip(self, caller, request), fields(uid = %caller.uid))]
    pub async fn set_admin_claim(
        &self,
        caller: &AuthUser,
        request: &SetClaimRequest,
    ) -> Result<String, AppError> {
        caller.require_role(Role::Admin)?;
        let (target, is_admin) = validate_set_claim(request)?;

        self.identity.set_admin_claim(&target, is_admin).await?;

        info!(target = %target, is_admin, "Admin claim changed");
        Ok(if is_admin {
            "User is now an admin.".to_string()
        } else {
            "User is no longer an admin.".to_string()
        })
    }

    /// Create identities and profile documents one entry at a time. A failed
    /// entry is reported and never aborts the batch.
    #[instrument(skip(self, caller, request), fields(uid = %caller.uid))]
    pub async fn bulk_create_users(
        &self,
        caller: &AuthUser,
        request: BulkCreateUsersRequest,
    ) -> Result<BulkCreateUsersResponse, AppError> {
        caller.require_role(Role::Admin)?;
        let entries = request
            .users
            .ok_or_else(|| AppError::Validation("Invalid users array.".into()))?;

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            results.push(self.create_one(entry).await);
        }

        let created = results
            .iter()
            .filter(|r| r.uid.is_some())
            .count();
        info!(created, failed = results.len() - created, "Bulk user creation finished");

        Ok(BulkCreateUsersResponse {
            message: "Bulk user creation finished.".into(),
            results,
        })
    }

    async fn create_one(&self, entry: BulkUserEntry) -> BulkCreateResult {
        let identifier = entry
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let password = entry.password.filter(|p| !p.is_empty());
        let (Some(identifier), Some(password)) = (identifier, password) else {
            return BulkCreateResult::failure(entry.identifier, "Missing identifier or password");
        };

        let record = match self
            .identity
            .create_user(NewIdentity {
                email: identifier.clone(),
                password,
                ..Default::default()
            })
            .await
        {
            Ok(record) => record,
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Failed to create identity");
                return BulkCreateResult::failure(Some(identifier), e.to_string());
            }
        };

        let profile = profile_document(&record.uid, &identifier, entry.profile);
        if let Err(e) = profile.insert(&self.db).await {
            warn!(uid = %record.uid, error = %e, "Profile insert failed, removing identity");
            if let Err(cleanup) = self.identity.delete_user(&record.uid).await {
                warn!(uid = %record.uid, error = %cleanup, "Failed to remove identity");
            }
            return BulkCreateResult::failure(Some(identifier), e.to_string());
        }

        BulkCreateResult::success(&identifier, record.uid)
    }

    /// Delete every identity not on the whitelist together with its profile
    /// document and profile picture. Each deletion is best-effort.
    #[instrument(skip(self, caller, request), fields(uid = %caller.uid))]
    pub async fn purge_non_whitelisted_users(
        &self,
        caller: &AuthUser,
        request: &PurgeUsersRequest,
    ) -> Result<PurgeUsersResponse, AppError> {
        caller.require_role(Role::Admin)?;
        let whitelist: HashSet<&str> = request
            .whitelist
            .iter()
            .flatten()
            .map(|uid| uid.trim())
            .filter(|uid| !uid.is_empty())
            .collect();
        if whitelist.is_empty() {
            return Err(AppError::Validation("Whitelist must not be empty".into()));
        }

        let (kept_uids, deleted_uids): (Vec<String>, Vec<String>) = self
            .all_identities()
            .await?
            .into_iter()
            .map(|u| u.uid)
            .partition(|uid| whitelist.contains(uid.as_str()));

        for uid in &deleted_uids {
            if let Err(e) = self.identity.delete_user(uid).await {
                warn!(uid = %uid, error = %e, "Failed to delete identity");
            }
            if let Err(e) = user_profile::Entity::delete_by_id(uid.clone())
                .exec(&self.db)
                .await
            {
                warn!(uid = %uid, error = %e, "Failed to delete profile document");
            }
            if let Err(e) = self.store.delete(&profile_picture_key(uid)).await {
                warn!(uid = %uid, error = %e, "Failed to delete profile picture");
            }
        }

        info!(
            deleted = deleted_uids.len(),
            kept = kept_uids.len(),
            "Purged non-whitelisted users"
        );
        Ok(PurgeUsersResponse {
            deleted_count: deleted_uids.len(),
            kept_count: kept_uids.len(),
            deleted_uids,
            kept_uids,
        })
    }

    /// Every identity merged with its profile document.
    #[instrument(skip(self, caller), fields(uid = %caller.uid))]
    pub async fn list_users(&self, caller: &AuthUser) -> Result<Vec<UserRecord>, AppError> {
        caller.require_role(Role::Admin)?;
        let identities = self.all_identities().await?;
        self.merge_records(identities).await
    }

    /// Like [`Self::list_users`], restricted to admins.
    #[instrument(skip(self, caller), fields(uid = %caller.uid))]
    pub async fn list_admins(&self, caller: &AuthUser) -> Result<Vec<UserRecord>, AppError> {
        caller.require_role(Role::Admin)?;
        let admins = self
            .all_identities()
            .await?
            .into_iter()
            .filter(|u| u.is_admin)
            .collect();
        self.merge_records(admins).await
    }

    /// Set the display name on both the identity and the profile document.
    #[instrument(skip(self, caller, request), fields(uid = %caller.uid))]
    pub async fn update_display_name(
        &self,
        caller: &AuthUser,
        target: &str,
        request: &UpdateDisplayNameRequest,
    ) -> Result<(), AppError> {
        caller.require_role(Role::Admin)?;
        let display_name = validate_display_name(request)?;

        let record = self.require_identity(target).await?;
        self.identity
            .update_display_name(&record.uid, &display_name)
            .await?;

        match user_profile::Entity::find_by_id(record.uid.clone())
            .one(&self.db)
            .await?
        {
            Some(profile) => {
                let mut active: user_profile::ActiveModel = profile.into();
                active.display_name = Set(Some(display_name));
                active.update(&self.db).await?;
            }
            None => {
                let mut profile = profile_document(&record.uid, &record.email, Map::new());
                profile.display_name = Set(Some(display_name));
                profile.insert(&self.db).await?;
            }
        }
        Ok(())
    }

    /// Store a cropped WebP profile picture at `profilepics/<uid>.webp`.
    /// Returns the object key.
    #[instrument(skip(self, caller, image), fields(uid = %caller.uid, size = image.len()))]
    pub async fn set_profile_picture(
        &self,
        caller: &AuthUser,
        target: &str,
        image: Vec<u8>,
    ) -> Result<String, AppError> {
        caller.require_role(Role::Admin)?;
        if !is_webp(&image) {
            return Err(AppError::Validation(
                "Profile picture must be a WebP image".into(),
            ));
        }

        let record = self.require_identity(target).await?;
        let key = profile_picture_key(&record.uid);
        self.store
            .put(&key, image, PutOptions::new("image/webp"))
            .await?;

        match user_profile::Entity::find_by_id(record.uid.clone())
            .one(&self.db)
            .await?
        {
            Some(profile) => {
                let mut active: user_profile::ActiveModel = profile.into();
                active.profile_pic = Set(Some(key.clone()));
                active.update(&self.db).await?;
            }
            None => {
                let mut profile = profile_document(&record.uid, &record.email, Map::new());
                profile.profile_pic = Set(Some(key.clone()));
                profile.insert(&self.db).await?;
            }
        }
        Ok(key)
    }

    async fn require_identity(&self, uid: &str) -> Result<IdentityRecord, AppError> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(AppError::Validation("User ID is required".into()));
        }
        self.identity
            .get_user(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{uid}' not found")))
    }

    async fn all_identities(&self) -> Result<Vec<IdentityRecord>, AppError> {
        let mut users = Vec::new();
        let mut page_token = None;
        loop {
            let page = self
                .identity
                .list_users(LIST_PAGE_SIZE, page_token)
                .await?;
            users.extend(page.users);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(users)
    }

    async fn merge_records(
        &self,
        identities: Vec<IdentityRecord>,
    ) -> Result<Vec<UserRecord>, AppError> {
        let mut profiles: HashMap<String, user_profile::Model> = user_profile::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| (p.uid.clone(), p))
            .collect();
        let pictures: HashSet<String> = self
            .store
            .list(PROFILE_PIC_PREFIX)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect();

        let mut records = Vec::with_capacity(identities.len());
        for identity in identities {
            let key = profile_picture_key(&identity.uid);
            let profile_pic = if pictures.contains(&key) {
                self.store.signed_url(&key, self.signed_url_ttl).await?
            } else {
                DEFAULT_PROFILE_PIC.to_string()
            };
            let profile = profiles.remove(&identity.uid);
            records.push(merge_user(identity, profile, profile_pic));
        }
        Ok(records)
    }
}

/// Merge an identity with its profile document. Identity fields win for
/// e-mail, display name and phone number; the profile wins for username.
fn merge_user(
    identity: IdentityRecord,
    profile: Option<user_profile::Model>,
    profile_pic: String,
) -> UserRecord {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let profile = profile.as_ref();
    let doc = |f: fn(&user_profile::Model) -> &Option<String>| {
        non_empty(profile.and_then(|p| f(p).clone()))
    };

    let email = non_empty(Some(identity.email))
        .or_else(|| doc(|p| &p.email))
        .or_else(|| doc(|p| &p.identifier));
    let identity_display = non_empty(identity.display_name);
    let display_name = identity_display
        .clone()
        .or_else(|| doc(|p| &p.display_name))
        .or_else(|| doc(|p| &p.name));
    let username = doc(|p| &p.username)
        .or_else(|| doc(|p| &p.name))
        .or(identity_display);
    let phone_number = non_empty(identity.phone_number).or_else(|| doc(|p| &p.phone_number));
    let extra = match profile.map(|p| &p.extra) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    UserRecord {
        uid: identity.uid,
        email,
        display_name,
        username,
        phone_number,
        created_at: profile.map(|p| p.created_at).unwrap_or(identity.created_at),
        profile_pic,
        is_admin: identity.is_admin,
        extra,
    }
}

/// Build a profile document from bulk-import fields. Known fields map to
/// columns; everything else is kept in `extra`.
fn profile_document(
    uid: &str,
    identifier: &str,
    mut fields: Map<String, Value>,
) -> user_profile::ActiveModel {
    let mut take = |key: &str| match fields.remove(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    user_profile::ActiveModel {
        uid: Set(uid.to_string()),
        identifier: Set(Some(identifier.to_string())),
        display_name: Set(take("displayName")),
        username: Set(take("username")),
        name: Set(take("name")),
        email: Set(take("email")),
        phone_number: Set(take("phoneNumber")),
        profile_pic: Set(None),
        extra: Set(Value::Object(fields)),
        created_at: Set(Utc::now()),
    }
}
