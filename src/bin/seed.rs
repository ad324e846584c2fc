use mulebay::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, create_pool, run_migrations},
    entity::{
        items::{ActiveModel as ItemActive, Column as ItemCol, Entity as Items},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    media::ITEM_PLACEHOLDER,
    models::{id_list, id_list_value},
    services::auth_service::hash_password,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    let orm = create_orm_conn(pool);
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let seller_id = ensure_user(&orm, "seller@colby.edu", "seller-pass", "Sam", "Seller").await?;
    let buyer_id = ensure_user(&orm, "buyer@colby.edu", "buyer-pass", "Bea", "Buyer").await?;
    seed_items(&orm, seller_id).await?;

    println!("Seed completed. Seller ID: {seller_id}, Buyer ID: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        profile_image: Set(None),
        profile_description: Set(Some("Seeded account".to_string())),
        bookmark_items: Set(serde_json::json!([])),
        selling_items: Set(serde_json::json!([])),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    println!("Created user {email}");
    Ok(user.id)
}

async fn seed_items(orm: &OrmConn, seller_id: Uuid) -> anyhow::Result<()> {
    let listings = [
        ("Desk Lamp", "Warm LED lamp, barely used", 1500_i64, "Like new", vec!["Cash", "Venmo"]),
        ("Mini Fridge", "Fits under a dorm bed", 6000, "Good", vec!["Venmo"]),
        ("Calculus Textbook", "Stewart, 8th edition", 2500, "Fair", vec!["Cash"]),
        ("Winter Jacket", "Size M, very warm", 4000, "Good", vec!["Cash", "Zelle"]),
    ];

    let mut listed = Vec::new();
    for (name, description, price_cents, condition, payment_options) in listings {
        let exists = Items::find()
            .filter(ItemCol::SellerId.eq(seller_id))
            .filter(ItemCol::Name.eq(name))
            .one(orm)
            .await?;
        if exists.is_some() {
            continue;
        }

        let item = ItemActive {
            id: Set(Uuid::new_v4()),
            seller_id: Set(seller_id),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            item_photos: Set(ITEM_PLACEHOLDER.to_string()),
            price_cents: Set(price_cents),
            condition: Set(Some(condition.to_string())),
            payment_options: Set(serde_json::json!(payment_options)),
            live_on_market: Set(true),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
        listed.push(item.id);
    }

    if let Some(seller) = Users::find_by_id(seller_id).one(orm).await? {
        let mut selling = id_list(&seller.selling_items);
        selling.extend(listed.iter().copied());
        let mut active: UserActive = seller.into();
        active.selling_items = Set(id_list_value(&selling));
        active.update(orm).await?;
    }

    println!("Seeded {} items", listed.len());
    Ok(())
}
