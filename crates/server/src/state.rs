use std::{num::NonZeroUsize, sync::Arc};

use db::DBService;
use lru::LruCache;
use services::services::{
    blob_store::BlobStore,
    busy::BusyFlag,
    notification::NotificationCenter,
    profile::{LoadOutcome, ProfileCapabilities, ProfileViewController},
    profile_store::{ProfileStore, SqliteProfileStore},
};
use tokio::sync::{Mutex, OnceCell};

use crate::config::ServerConfig;

/// A mounted profile page: the controller plus the alerts raised for it.
pub struct ProfilePage {
    controller: ProfileViewController,
    notifications: Arc<NotificationCenter>,
    mounted: OnceCell<LoadOutcome>,
}

impl ProfilePage {
    pub fn controller(&self) -> &ProfileViewController {
        &self.controller
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }
}

/// One mounted profile page per signed-in user, least recently used pages
/// evicted beyond `capacity`. A page is loaded once when it is first mounted
/// and afterwards only by explicit reloads and saves.
pub struct ProfilePages {
    store: Arc<dyn ProfileStore>,
    blobs: Arc<dyn BlobStore>,
    picture_collection: String,
    mounted: Mutex<LruCache<String, Arc<ProfilePage>>>,
}

impl ProfilePages {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        blobs: Arc<dyn BlobStore>,
        picture_collection: String,
        capacity: NonZeroUsize,
    ) -> Self {
        Self {
            store,
            blobs,
            picture_collection,
            mounted: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the user's page once its first load has finished.
    pub async fn mount(&self, user_id: &str) -> Arc<ProfilePage> {
        let page = {
            let mut mounted = self.mounted.lock().await;
            match mounted.get(user_id) {
                Some(page) => Arc::clone(page),
                None => {
                    let page = Arc::new(self.new_page(user_id));
                    if let Some((evicted, _)) =
                        mounted.push(user_id.to_owned(), Arc::clone(&page))
                    {
                        tracing::debug!(user_id = %evicted, "evicted profile page");
                    }
                    page
                }
            }
        };

        page.mounted
            .get_or_init(|| async {
                tracing::debug!(user_id, "mounting profile page");
                page.controller.load().await
            })
            .await;
        page
    }

    fn new_page(&self, user_id: &str) -> ProfilePage {
        let notifications = Arc::new(NotificationCenter::new());
        let caps = ProfileCapabilities {
            store: Arc::clone(&self.store),
            blobs: Arc::clone(&self.blobs),
            notifier: notifications.clone(),
            busy: Arc::new(BusyFlag::new()),
            picture_collection: self.picture_collection.clone(),
        };
        ProfilePage {
            controller: ProfileViewController::new(user_id, caps),
            notifications,
            mounted: OnceCell::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    pages: Arc<ProfilePages>,
}

impl AppState {
    pub fn new(config: ServerConfig, db: DBService, blobs: Arc<dyn BlobStore>) -> Self {
        let pages = ProfilePages::new(
            Arc::new(SqliteProfileStore::new(db)),
            blobs,
            config.picture_collection.clone(),
            config.max_mounted_pages,
        );

        Self {
            config: Arc::new(config),
            pages: Arc::new(pages),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn pages(&self) -> &ProfilePages {
        &self.pages
    }
}
