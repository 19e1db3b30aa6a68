use common::Timestamped;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A production run.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: Uuid,

    #[sea_orm(has_many)]
    pub details: HasMany<super::production_detail::Entity>,

    /// Read-only: products reachable through `production_detail` rows.
    #[sea_orm(has_many, via = "production_detail")]
    pub products: HasMany<super::product::Entity>,

    pub added: DateTimeUtc,
}

impl Timestamped for Model {
    fn added(&self) -> DateTimeUtc {
        self.added
    }
}

impl ActiveModelBehavior for ActiveModel {}
