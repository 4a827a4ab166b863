//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc, to_bson},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repository::UserRepository;

const COLLECTION: &str = "users";
const EMAIL_INDEX: &str = "email_unique";
const DUPLICATE_KEY: i32 = 11000;

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: Database) -> Self {
        let collection = db.collection::<User>(COLLECTION);
        Self { collection }
    }

    /// Create the unique email index. Safe to call on every startup.
    #[instrument(skip(self))]
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(EMAIL_INDEX.to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(index).await?;
        tracing::info!(collection = COLLECTION, index = EMAIL_INDEX, "Indexes ensured");
        Ok(())
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": bson_uuid::to_bson_uuid(id) }
    }

    fn profile_update(input: &UpdateUser, now: DateTime<Utc>) -> StoreResult<Document> {
        Ok(doc! {
            "$set": {
                "name": input.name.as_str(),
                "email": input.email.as_str(),
                "updated_at": to_bson(&now)?,
            }
        })
    }

    fn password_update(password_hash: &str, now: DateTime<Utc>) -> StoreResult<Document> {
        Ok(doc! {
            "$set": {
                "password_hash": password_hash,
                "updated_at": to_bson(&now)?,
            }
        })
    }

    /// UUID v7 ids sort by creation time
    fn list_options() -> FindOptions {
        FindOptions::builder().sort(doc! { "_id": 1 }).build()
    }
}

/// `_id` as BSON binary subtype 4.
///
/// A plain `Uuid` field would be written as generic binary by the driver but
/// rendered as a string by `to_bson`, so ids would never match their filters.
pub(crate) mod bson_uuid {
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use uuid::Uuid;

    pub fn to_bson_uuid(id: Uuid) -> bson::Uuid {
        bson::Uuid::from_bytes(id.into_bytes())
    }

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        to_bson_uuid(*id).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        bson::Uuid::deserialize(deserializer).map(|id| Uuid::from_bytes(id.bytes()))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == DUPLICATE_KEY
    )
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> StoreResult<Vec<User>> {
        use futures_util::TryStreamExt;

        let cursor = self
            .collection
            .find(doc! {})
            .with_options(Self::list_options())
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(user)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn create(&self, input: NewUser) -> StoreResult<User> {
        let user = User::new(input);

        match self.collection.insert_one(&user).await {
            Ok(_) => {}
            Err(e) if is_duplicate_key(&e) => return Err(StoreError::DuplicateEmail(user.email)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "User document inserted");
        Ok(user)
    }

    #[instrument(skip(self, input))]
    async fn update_profile(&self, id: Uuid, input: UpdateUser) -> StoreResult<bool> {
        let update = Self::profile_update(&input, Utc::now())?;

        match self.collection.update_one(Self::id_filter(id), update).await {
            Ok(result) => Ok(result.matched_count > 0),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateEmail(input.email)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> StoreResult<bool> {
        let update = Self::password_update(&password_hash, Utc::now())?;
        let result = self.collection.update_one(Self::id_filter(id), update).await?;

        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        Ok(result.deleted_count > 0)
    }
}
