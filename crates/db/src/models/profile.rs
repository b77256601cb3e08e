use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, types::Json};
use thiserror::Error;
use utils::api::profile::{FieldGroup, PersonalInfo, ProfileRecord, ShowCase};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Profile not found")]
    NotFound,
}

/// A stored profile document together with its bookkeeping columns.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileDocument {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub about: String,
    pub profile_picture: String,
    pub show_case: Json<ShowCase>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_COLUMNS: &str = "user_id, first_name, last_name, email, about, profile_picture, \
                              show_case, created_at, updated_at";

impl ProfileDocument {
    pub fn into_record(self) -> ProfileRecord {
        ProfileRecord {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            about: self.about,
            profile_picture: self.profile_picture,
            show_case: self.show_case.0,
        }
    }

    pub async fn find_by_user_id<'e, E>(
        executor: E,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ProfileDocument>(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_profiles WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Inserts the document for a user. Profiles are provisioned outside the
    /// edit flow; the page itself only reads and patches.
    pub async fn create<'e, E>(
        executor: E,
        user_id: &str,
        record: &ProfileRecord,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ProfileDocument>(&format!(
            "INSERT INTO user_profiles
                 (user_id, first_name, last_name, email, about, profile_picture, show_case)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.about)
        .bind(&record.profile_picture)
        .bind(Json(&record.show_case))
        .fetch_one(executor)
        .await
    }

    /// Replaces exactly the fields of one group, leaving the other untouched.
    pub async fn apply_field_group<'e, E>(
        executor: E,
        user_id: &str,
        group: &FieldGroup,
    ) -> Result<(), ProfileError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = match group {
            FieldGroup::PersonalInfo(info) => {
                Self::update_personal_info(executor, user_id, info).await?
            }
            FieldGroup::ShowCase { show_case } => {
                Self::update_show_case(executor, user_id, show_case).await?
            }
        };

        if rows == 0 {
            return Err(ProfileError::NotFound);
        }
        Ok(())
    }

    async fn update_personal_info<'e, E>(
        executor: E,
        user_id: &str,
        info: &PersonalInfo,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE user_profiles
               SET first_name = ?,
                   last_name = ?,
                   email = ?,
                   about = ?,
                   profile_picture = ?,
                   updated_at = datetime('now', 'subsec')
               WHERE user_id = ?"#,
        )
        .bind(&info.first_name)
        .bind(&info.last_name)
        .bind(&info.email)
        .bind(&info.about)
        .bind(&info.profile_picture)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_show_case<'e, E>(
        executor: E,
        user_id: &str,
        show_case: &ShowCase,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE user_profiles
               SET show_case = ?,
                   updated_at = datetime('now', 'subsec')
               WHERE user_id = ?"#,
        )
        .bind(Json(show_case))
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn sample_record() -> ProfileRecord {
        ProfileRecord {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@example.com".into(),
            about: "Builds things".into(),
            profile_picture: "https://cdn/ann.png".into(),
            show_case: ShowCase {
                github: "https://github.com/ann".into(),
                ..ShowCase::default()
            },
        }
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let db = DBService::new_in_memory().await.unwrap();
        let found = ProfileDocument::find_by_user_id(&db.pool, "nobody")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn created_document_round_trips_record() {
        let db = DBService::new_in_memory().await.unwrap();
        let record = sample_record();
        ProfileDocument::create(&db.pool, "u1", &record).await.unwrap();

        let stored = ProfileDocument::find_by_user_id(&db.pool, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, "u1");
        assert_eq!(stored.into_record(), record);
    }

    #[tokio::test]
    async fn personal_update_leaves_show_case_alone() {
        let db = DBService::new_in_memory().await.unwrap();
        let record = sample_record();
        ProfileDocument::create(&db.pool, "u1", &record).await.unwrap();

        let group = FieldGroup::PersonalInfo(PersonalInfo {
            first_name: "Anna".into(),
            last_name: "Lee".into(),
            email: "anna@example.com".into(),
            about: String::new(),
            profile_picture: "https://cdn/new.png".into(),
        });
        ProfileDocument::apply_field_group(&db.pool, "u1", &group)
            .await
            .unwrap();

        let stored = ProfileDocument::find_by_user_id(&db.pool, "u1")
            .await
            .unwrap()
            .unwrap()
            .into_record();
        assert_eq!(stored.first_name, "Anna");
        assert_eq!(stored.profile_picture, "https://cdn/new.png");
        assert_eq!(stored.show_case, record.show_case);
    }

    #[tokio::test]
    async fn show_case_update_leaves_personal_fields_alone() {
        let db = DBService::new_in_memory().await.unwrap();
        let record = sample_record();
        ProfileDocument::create(&db.pool, "u1", &record).await.unwrap();

        let show_case = ShowCase {
            youtube: "https://youtube.com/@ann".into(),
            ..ShowCase::default()
        };
        let group = FieldGroup::ShowCase {
            show_case: show_case.clone(),
        };
        ProfileDocument::apply_field_group(&db.pool, "u1", &group)
            .await
            .unwrap();

        let stored = ProfileDocument::find_by_user_id(&db.pool, "u1")
            .await
            .unwrap()
            .unwrap()
            .into_record();
        assert_eq!(stored.show_case, show_case);
        assert_eq!(stored.first_name, record.first_name);
        assert_eq!(stored.about, record.about);
    }

    #[tokio::test]
    async fn patching_missing_document_is_not_found() {
        let db = DBService::new_in_memory().await.unwrap();
        let group = FieldGroup::ShowCase {
            show_case: ShowCase::default(),
        };
        let err = ProfileDocument::apply_field_group(&db.pool, "ghost", &group)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound));
    }
}
