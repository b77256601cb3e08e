use async_trait::async_trait;
use db::{
    DBService,
    models::profile::{ProfileDocument, ProfileError},
};
use thiserror::Error;
use utils::api::profile::{FieldGroup, ProfileRecord};

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("profile not found")]
    NotFound,
    #[error("profile store unavailable: {0}")]
    Backend(String),
}

impl From<ProfileError> for ProfileStoreError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound => Self::NotFound,
            ProfileError::Database(e) => Self::Backend(e.to_string()),
        }
    }
}

/// Document store holding one [`ProfileRecord`] per user id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn read(&self, user_id: &str) -> Result<ProfileRecord, ProfileStoreError>;

    /// Overwrites the fields of `group` only. Fails with `NotFound` when the
    /// document does not exist; it is never created here.
    async fn partial_update(
        &self,
        user_id: &str,
        group: &FieldGroup,
    ) -> Result<(), ProfileStoreError>;
}

#[derive(Clone)]
pub struct SqliteProfileStore {
    db: DBService,
}

impl SqliteProfileStore {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn read(&self, user_id: &str) -> Result<ProfileRecord, ProfileStoreError> {
        ProfileDocument::find_by_user_id(&self.db.pool, user_id)
            .await
            .map_err(|e| ProfileStoreError::Backend(e.to_string()))?
            .map(ProfileDocument::into_record)
            .ok_or(ProfileStoreError::NotFound)
    }

    async fn partial_update(
        &self,
        user_id: &str,
        group: &FieldGroup,
    ) -> Result<(), ProfileStoreError> {
        ProfileDocument::apply_field_group(&self.db.pool, user_id, group)
            .await
            .map_err(ProfileStoreError::from)
    }
}
