use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{media::Upload, models::Item, routes::params::Pagination};

/// Fields accepted by item create/update. Parsed from a multipart form.
#[derive(Debug, Default)]
pub struct ItemForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub condition: Option<String>,
    pub payment_options: Option<Vec<String>>,
    pub live_on_market: Option<bool>,
    pub image: Option<Upload>,
}

/// Multipart layout of [`ItemForm`] for the API docs.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ItemMultipart {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub condition: Option<String>,
    pub payment_options: Option<Vec<String>>,
    pub live_on_market: Option<bool>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image_file: Option<Vec<u8>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive match on name, description and condition.
    pub q: Option<String>,
    pub seller_id: Option<Uuid>,
    pub live: Option<bool>,
}

impl ItemQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ItemList {
    #[schema(value_type = Vec<Item>)]
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedItem {
    pub status: String,
    pub id: Uuid,
}
