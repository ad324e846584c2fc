use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::profile::ProfileForm,
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MAX_BIO_CHARS: usize = 2000;

/// Trims a bio and cuts it to [`MAX_BIO_CHARS`] characters.
pub fn normalize_bio(raw: &str) -> Option<String> {
    let bio: String = raw.trim().chars().take(MAX_BIO_CHARS).collect();
    if bio.is_empty() { None } else { Some(bio) }
}

async fn load_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    match Users::find_by_id(id).one(state.db()).await? {
        Some(user) => Ok(user),
        None => Err(AppError::Missing("User")),
    }
}

pub async fn my_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let me = load_user(state, user.user_id).await?;
    Ok(ApiResponse::success("Profile", Profile::from(me), None))
}

pub async fn get_profile(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Profile>> {
    let found = load_user(state, id).await?;
    Ok(ApiResponse::success("Profile", Profile::from(found), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    form: ProfileForm,
) -> AppResult<ApiResponse<Profile>> {
    let me = load_user(state, user.user_id).await?;

    let avatar = match &form.avatar {
        Some(upload) => Some(state.media.store_avatar(user.user_id, upload).await?),
        None => None,
    };

    let mut active: UserActive = me.into();
    if let Some(bio) = form.profile_description {
        active.profile_description = Set(normalize_bio(&bio));
    }
    if let Some(path) = avatar {
        active.profile_image = Set(Some(path));
    }
    let updated = active.update(state.db()).await?;

    audit::record(
        state.db(),
        user.user_id,
        "profile_update",
        "users",
        serde_json::json!({ "avatar_changed": form.avatar.is_some() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated!",
        Profile::from(updated),
        Some(Meta::empty()),
    ))
}
