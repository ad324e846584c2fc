use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{chats, items, users};

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    pub profile_description: Option<String>,
    pub bookmark_items: Vec<Uuid>,
    pub selling_items: Vec<Uuid>,
    pub date_created: DateTime<Utc>,
}

impl From<users::Model> for Profile {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            bookmark_items: id_list(&model.bookmark_items),
            selling_items: id_list(&model.selling_items),
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            profile_image: model.profile_image,
            profile_description: model.profile_description,
            date_created: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SellerSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl From<&users::Model> for SellerSummary {
    fn from(model: &users::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
        }
    }
}

/// An item as seen by a particular signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub item_photos: String,
    pub price: f64,
    pub price_cents: i64,
    pub condition: Option<String>,
    pub payment_options: Vec<String>,
    pub bookmarked: bool,
    pub live_on_market: bool,
    pub is_owner: bool,
    pub seller: Option<SellerSummary>,
    pub date_created: DateTime<Utc>,
}

impl Item {
    pub fn from_entity(
        model: items::Model,
        seller: Option<&users::Model>,
        viewer_id: Uuid,
        bookmarked: bool,
    ) -> Self {
        let payment_options = serde_json::from_value(model.payment_options).unwrap_or_default();
        Self {
            id: model.id,
            seller_id: model.seller_id,
            is_owner: model.seller_id == viewer_id,
            name: model.name,
            description: model.description,
            item_photos: model.item_photos,
            price: model.price_cents as f64 / 100.0,
            price_cents: model.price_cents,
            condition: model.condition,
            payment_options,
            bookmarked,
            live_on_market: model.live_on_market,
            seller: seller.map(SellerSummary::from),
            date_created: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Chat {
    pub id: Uuid,
    pub item_id: Uuid,
    pub seller_id: Uuid,
    pub buyer_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<chats::Model> for Chat {
    fn from(model: chats::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            seller_id: model.seller_id,
            buyer_ids: id_list(&model.buyer_ids),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Reads a JSON id array column, dropping entries that are not ids.
pub fn id_list(value: &serde_json::Value) -> Vec<Uuid> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_str())
                .filter_map(|raw| Uuid::parse_str(raw).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn id_list_value(ids: &[Uuid]) -> serde_json::Value {
    serde_json::Value::Array(
        ids.iter()
            .map(|id| serde_json::Value::String(id.to_string()))
            .collect(),
    )
}
