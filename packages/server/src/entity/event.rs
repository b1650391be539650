use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub drive_url: String,

    #[sea_orm(column_type = "Text")]
    pub thumbnail_url: String,

    /// Object key behind `thumbnail_url`.
    pub thumbnail_key: String,

    #[sea_orm(indexed)]
    pub event_date: DateTimeUtc,

    pub created_at: DateTimeUtc,

    pub uploaded_by_uid: String,

    pub uploaded_by_username: String,
}

impl ActiveModelBehavior for ActiveModel {}
