use crate::cache::{Clock, PageCache};
use crate::config::Config;
use crate::filesystem::MediaStore;
use argon2::Argon2;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Session key holding the logged in user's id.
pub const SESSION_USER_ID: &str = "user_id";

/// Application state shared by every worker.
pub struct MainData {
    pub db: DatabaseConnection,
    pub cache: PageCache,
    pub media: MediaStore,
    pub argon2: Argon2<'static>,
    pub config: Config,
}

impl MainData {
    pub fn new(config: Config, db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: PageCache::new(config.cache_ttl, clock),
            media: MediaStore::new(config.media_dir.to_owned()),
            argon2: Argon2::default(),
            db,
            config,
        }
    }

    /// Replaces the password hasher, e.g. with cheaper parameters.
    pub fn with_argon2(mut self, argon2: Argon2<'static>) -> Self {
        self.argon2 = argon2;
        self
    }
}
