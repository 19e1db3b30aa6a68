use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_detail")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: Uuid,

    #[sea_orm(indexed)]
    pub production_uid: Uuid,
    #[sea_orm(belongs_to, from = "production_uid", to = "uid", on_delete = "Cascade")]
    pub production: HasOne<super::production::Entity>,

    #[sea_orm(indexed)]
    pub product_uid: Uuid,
    #[sea_orm(belongs_to, from = "product_uid", to = "uid", on_delete = "Cascade")]
    pub product: HasOne<super::product::Entity>,

    pub produced_units: i64,
}

impl ActiveModelBehavior for ActiveModel {}
