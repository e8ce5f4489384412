use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "place_image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub place_id: i32,

    pub path: String,     // storage key, e.g. "places/0190....jpg"
    pub filename: String, // as uploaded
    pub content_type: Option<String>,
    pub size: i64, // bytes after normalization
    pub width: i32,
    pub height: i32,
    pub order: i32, // 0-based within the place

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::place::Entity",
        from = "Column::PlaceId",
        to = "super::place::Column::Id",
        on_delete = "Cascade"
    )]
    Place,
}

impl Related<super::place::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Place.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
