use common::Timestamped;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    /// Media path (`category/<slug>/<filename>`), if an image was uploaded.
    pub thumbnail: Option<String>,

    #[sea_orm(has_many)]
    pub items: HasMany<super::item::Entity>,

    #[sea_orm(has_many)]
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
