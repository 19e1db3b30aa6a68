use common::Timestamped;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A raw or purchasable unit of stock.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: Uuid,

    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((11, 2)))", nullable)]
    pub price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub amount: Option<Decimal>,
    pub measurement_unit: String,

    #[sea_orm(indexed)]
    pub category_id: i32,
    #[sea_orm(belongs_to, from = "category_id", to = "id", on_delete = "Restrict")]
    pub category: HasOne<super::category::Entity>,

    #[sea_orm(has_many)]
    pub components: HasMany<super::component::Entity>,

    #[sea_orm(has_many, via = "component")]
    pub products: HasMany<super::product::Entity>,

    pub added: DateTimeUtc,
}

impl Model {
    pub fn thumbnail_url(&self) -> String {
        super::thumbnail_url(self.thumbnail.as_deref())
    }
}

impl Timestamped for Model {
    fn added(&self) -> DateTimeUtc {
        self.added
    }
}

impl ActiveModelBehavior for ActiveModel {}
