use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile document of a user, keyed by the identity uid.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,

    pub identifier: Option<String>,

    pub display_name: Option<String>,

    pub username: Option<String>,

    pub name: Option<String>,

    pub email: Option<String>,

    pub phone_number: Option<String>,

    /// Object key of the profile picture.
    pub profile_pic: Option<String>,

    /// Any other profile fields supplied at creation, as a JSON object.
    #[sea_orm(column_type = "Json")]
    pub extra: Json,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
