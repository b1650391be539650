use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::entity::{account, user_profile};
use crate::identity::{IdentityError, IdentityProvider, NewIdentity};

/// Ensure the configured bootstrap admin exists and holds the admin claim.
///
/// Existing accounts keep their password; only the claim is (re)applied.
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    identity: &dyn IdentityProvider,
    admin: &BootstrapAdmin,
) -> Result<(), IdentityError> {
    let email = admin.email.trim();
    let existing = account::Entity::find()
        .filter(account::Column::Email.eq(email))
        .one(db)
        .await?;

    let uid = match existing {
        Some(account) => account.uid,
        None => {
            let created = identity
                .create_user(NewIdentity {
                    email: email.to_string(),
                    password: admin.password.clone(),
                    display_name: admin.display_name.clone(),
                    phone_number: None,
                })
                .await?;

            let profile = user_profile::ActiveModel {
                uid: Set(created.uid.clone()),
                identifier: Set(Some(email.to_string())),
                display_name: Set(admin.display_name.clone()),
                username: Set(None),
                name: Set(None),
                email: Set(Some(email.to_string())),
                phone_number: Set(None),
                profile_pic: Set(None),
                extra: Set(serde_json::json!({})),
                created_at: Set(Utc::now()),
            };
            profile.insert(db).await?;

            info!("Created bootstrap admin {}", email);
            created.uid
        }
    };

    identity.set_admin_claim(&uid, true).await
}
