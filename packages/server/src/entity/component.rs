use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recipe line: how much of an item goes into a product.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "component")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: Uuid,

    #[sea_orm(indexed)]
    pub product_uid: Uuid,
    #[sea_orm(belongs_to, from = "product_uid", to = "uid", on_delete = "Cascade")]
    pub product: HasOne<super::product::Entity>,

    #[sea_orm(indexed)]
    pub item_uid: Uuid,
    #[sea_orm(belongs_to, from = "item_uid", to = "uid", on_delete = "Cascade")]
    pub item: HasOne<super::item::Entity>,

    /// Quantity of the item per kilogram of finished product.
    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub amount: Option<Decimal>,
}

impl ActiveModelBehavior for ActiveModel {}
