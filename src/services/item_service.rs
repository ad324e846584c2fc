use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    dto::items::{DeletedItem, ItemForm, ItemList, ItemQuery},
    entity::{
        items::{ActiveModel as ItemActive, Column as ItemCol, Entity as Items, Model as ItemModel},
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    media::ITEM_PLACEHOLDER,
    middleware::auth::{AuthUser, ensure_owner},
    models::{Item, id_list, id_list_value},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MAX_PRICE_CENTS: i64 = 100_000_000;
const MAX_NAME_LEN: usize = 80;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_CONDITION_LEN: usize = 50;

/// Parses a user supplied price such as `"12.5"` into whole cents.
pub fn parse_price(raw: &str) -> AppResult<i64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Price must be a number".into()))?;
    if !value.is_finite() {
        return Err(AppError::BadRequest("Price must be a number".into()));
    }
    if value < 0.0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    let cents = (value * 100.0).round();
    if cents > MAX_PRICE_CENTS as f64 {
        return Err(AppError::BadRequest(format!(
            "Price cannot exceed {}",
            MAX_PRICE_CENTS / 100
        )));
    }
    Ok(cents as i64)
}

fn check_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn list_items(
    state: &AppState,
    user: &AuthUser,
    query: ItemQuery,
) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(seller_id) = query.seller_id {
        condition = condition.add(ItemCol::SellerId.eq(seller_id));
    }

    if let Some(live) = query.live {
        condition = condition.add(ItemCol::LiveOnMarket.eq(live));
    }

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ItemCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ItemCol::Description).ilike(pattern.clone()))
                .add(Expr::col(ItemCol::Condition).ilike(pattern)),
        );
    }

    let finder = Items::find()
        .filter(condition)
        .order_by_desc(ItemCol::CreatedAt);

    let total = finder.clone().count(state.db()).await? as i64;

    let rows = finder
        .find_also_related(Users)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?;

    let bookmarks = viewer_bookmarks(state, user.user_id).await?;
    let items = rows
        .into_iter()
        .map(|(item, seller)| {
            let bookmarked = bookmarks.contains(&item.id);
            Item::from_entity(item, seller.as_ref(), user.user_id, bookmarked)
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Items", ItemList { items }, Some(meta)))
}

pub async fn get_item(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Item>> {
    let (item, seller) = match Items::find_by_id(id)
        .find_also_related(Users)
        .one(state.db())
        .await?
    {
        Some(row) => row,
        None => return Err(AppError::Missing("Item")),
    };

    let bookmarked = viewer_bookmarks(state, user.user_id)
        .await?
        .contains(&item.id);
    Ok(ApiResponse::success(
        "Item",
        Item::from_entity(item, seller.as_ref(), user.user_id, bookmarked),
        None,
    ))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    form: ItemForm,
) -> AppResult<ApiResponse<Item>> {
    let name = non_empty(form.name);
    let price = non_empty(form.price);
    let (name, price) = match (name, price) {
        (Some(name), Some(price)) => (name, price),
        _ => return Err(AppError::BadRequest("Missing name or price".into())),
    };
    let price_cents = parse_price(&price)?;
    check_len("Name", &name, MAX_NAME_LEN)?;
    let description = non_empty(form.description);
    if let Some(description) = &description {
        check_len("Description", description, MAX_DESCRIPTION_LEN)?;
    }
    let condition = non_empty(form.condition);
    if let Some(condition) = &condition {
        check_len("Condition", condition, MAX_CONDITION_LEN)?;
    }

    let item_photos = match &form.image {
        Some(upload) => state.media.store_item_photo(user.user_id, upload).await?,
        None => ITEM_PLACEHOLDER.to_string(),
    };

    let txn = state.db().begin().await?;

    let seller = match Users::find_by_id(user.user_id).one(&txn).await? {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Unknown user".into())),
    };

    let item = ItemActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(user.user_id),
        name: Set(name),
        description: Set(description),
        item_photos: Set(item_photos),
        price_cents: Set(price_cents),
        condition: Set(condition),
        payment_options: Set(serde_json::json!(form.payment_options.unwrap_or_default())),
        live_on_market: Set(form.live_on_market.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut selling = id_list(&seller.selling_items);
    selling.push(item.id);
    let mut seller_active: UserActive = seller.into();
    seller_active.selling_items = Set(id_list_value(&selling));
    let seller = seller_active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        state.db(),
        user.user_id,
        "item_create",
        "items",
        serde_json::json!({ "item_id": item.id }),
    )
    .await;
    tracing::info!(item_id = %item.id, seller_id = %user.user_id, "item listed");

    Ok(ApiResponse::success(
        "Item created",
        Item::from_entity(item, Some(&seller), user.user_id, false),
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    form: ItemForm,
) -> AppResult<ApiResponse<Item>> {
    let existing = match Items::find_by_id(id).one(state.db()).await? {
        Some(item) => item,
        None => return Err(AppError::Missing("Item")),
    };
    ensure_owner(user, existing.seller_id, "edit")?;

    let mut active: ItemActive = existing.into();
    if let Some(name) = non_empty(form.name) {
        check_len("Name", &name, MAX_NAME_LEN)?;
        active.name = Set(name);
    }
    if let Some(description) = form.description {
        check_len("Description", &description, MAX_DESCRIPTION_LEN)?;
        active.description = Set(non_empty(Some(description)));
    }
    if let Some(price) = non_empty(form.price) {
        active.price_cents = Set(parse_price(&price)?);
    }
    if let Some(condition) = form.condition {
        check_len("Condition", &condition, MAX_CONDITION_LEN)?;
        active.condition = Set(non_empty(Some(condition)));
    }
    if let Some(payment_options) = form.payment_options {
        active.payment_options = Set(serde_json::json!(payment_options));
    }
    if let Some(live) = form.live_on_market {
        active.live_on_market = Set(live);
    }
    if let Some(upload) = &form.image {
        let path = state.media.store_item_photo(user.user_id, upload).await?;
        active.item_photos = Set(path);
    }

    let item = active.update(state.db()).await?;
    let seller = Users::find_by_id(item.seller_id).one(state.db()).await?;
    let bookmarked = viewer_bookmarks(state, user.user_id)
        .await?
        .contains(&item.id);

    audit::record(
        state.db(),
        user.user_id,
        "item_update",
        "items",
        serde_json::json!({ "item_id": item.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Item::from_entity(item, seller.as_ref(), user.user_id, bookmarked),
        Some(Meta::empty()),
    ))
}

pub async fn delete_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeletedItem>> {
    let existing: ItemModel = match Items::find_by_id(id).one(state.db()).await? {
        Some(item) => item,
        None => return Err(AppError::Missing("Item")),
    };
    ensure_owner(user, existing.seller_id, "delete")?;

    let txn = state.db().begin().await?;
    Items::delete_by_id(id).exec(&txn).await?;

    if let Some(seller) = Users::find_by_id(existing.seller_id).one(&txn).await? {
        let selling: Vec<Uuid> = id_list(&seller.selling_items)
            .into_iter()
            .filter(|listed| *listed != id)
            .collect();
        let mut seller_active: UserActive = seller.into();
        seller_active.selling_items = Set(id_list_value(&selling));
        seller_active.update(&txn).await?;
    }
    txn.commit().await?;

    audit::record(
        state.db(),
        user.user_id,
        "item_delete",
        "items",
        serde_json::json!({ "item_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        DeletedItem {
            status: "deleted".into(),
            id,
        },
        Some(Meta::empty()),
    ))
}

pub(crate) async fn viewer_bookmarks(state: &AppState, user_id: Uuid) -> AppResult<HashSet<Uuid>> {
    let viewer: Option<UserModel> = Users::find_by_id(user_id).one(state.db()).await?;
    Ok(viewer
        .map(|u| id_list(&u.bookmark_items).into_iter().collect())
        .unwrap_or_default())
}
