use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity record: credentials plus the admin claim embedded in tokens.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,

    #[sea_orm(unique)]
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub display_name: Option<String>,

    pub phone_number: Option<String>,

    #[sea_orm(default_value = false, indexed)]
    pub is_admin: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
