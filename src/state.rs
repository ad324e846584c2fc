use std::sync::Arc;

use crate::{
    chat::ChatHub,
    config::AppConfig,
    db::OrmConn,
    media::MediaStore,
    oauth::{GoogleProvider, IdentityProvider},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: Arc<OrmConn>,
    pub config: Arc<AppConfig>,
    pub chat: Arc<ChatHub>,
    pub media: MediaStore,
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        let identity = config
            .google
            .clone()
            .map(|google| Arc::new(GoogleProvider::new(google)) as Arc<dyn IdentityProvider>);
        Self {
            chat: Arc::new(ChatHub::new(config.chat_room_capacity)),
            media: MediaStore::new(config.upload_dir.clone(), config.max_upload_bytes),
            identity,
            config: Arc::new(config),
            orm: Arc::new(orm),
        }
    }

    pub fn db(&self) -> &OrmConn {
        &self.orm
    }

    /// Swap the identity provider, used to plug in a fake in tests.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }
}
