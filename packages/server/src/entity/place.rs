use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "place")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    pub location: Option<String>,
    pub rating: Option<i32>, // 1-5
    #[sea_orm(column_type = "Text", nullable)]
    pub review: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub pros: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub cons: Option<String>,
    pub dates: String, // "DD.MM.YYYY – DD.MM.YYYY", or free text

    // Owner as reported by the upstream auth layer; not validated here.
    pub user_id: Option<i32>,
    pub username: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::place_image::Entity")]
    Images,
}

impl Related<super::place_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
