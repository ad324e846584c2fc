use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, SignupRequest},
        bookmarks::{BookmarkRequest, BookmarkState},
        items::{DeletedItem, ItemList, ItemMultipart},
        profile::ProfileMultipart,
    },
    models::{Chat, Item, Profile, SellerSummary},
    response::{ApiResponse, Meta},
    routes::{auth, bookmarks, chat, health, items, params, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "MuleBay API", description = "Campus marketplace: listings, bookmarks, profiles and item chat"),
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        auth::logout,
        auth::google_login,
        auth::google_callback,
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        items::get_chat,
        chat::chat_socket,
        bookmarks::set_bookmark,
        bookmarks::list_bookmarks,
        profile::my_profile,
        profile::update_profile,
        profile::get_profile
    ),
    components(
        schemas(
            Profile,
            Item,
            SellerSummary,
            Chat,
            SignupRequest,
            LoginRequest,
            LoginResponse,
            BookmarkRequest,
            BookmarkState,
            ItemList,
            ItemMultipart,
            ProfileMultipart,
            DeletedItem,
            params::Pagination,
            health::HealthData,
            Meta,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<Profile>,
            ApiResponse<LoginResponse>,
            ApiResponse<BookmarkState>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup, login, logout and Google sign-in"),
        (name = "Items", description = "Marketplace listings"),
        (name = "Bookmarks", description = "Saved items"),
        (name = "Profile", description = "User profiles and avatars"),
        (name = "Chat", description = "Per-item real-time chat rooms"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
