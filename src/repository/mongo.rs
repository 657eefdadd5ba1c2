use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteError, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};
use secrecy::ExposeSecret;

use super::Store;
use crate::{
    config::DatabaseConfig,
    domain::{
        errors::DatabaseError,
        fields::{Email, UserId},
        model::{
        ReferralBonusDocument, StatusCheckDocument, TransactionDocument, UserDocument,
    },
    },
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub async fn connect(db_config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(db_config.uri.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("connecting to mongodb failed >>> {}", e);
                DatabaseError::ServerError
            })?;
        let db = client.database(&db_config.name);
        tracing::info!(database = %db_config.name, "mongodb client ready");
        Ok(Self { client, db })
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection("users")
    }

    fn referral_bonuses(&self) -> Collection<ReferralBonusDocument> {
        self.db.collection("referral_bonuses")
    }

    fn transaction_history(&self) -> Collection<TransactionDocument> {
        self.db.collection("transaction_history")
    }

    fn status_checks(&self) -> Collection<StatusCheckDocument> {
        self.db.collection("status_checks")
    }

    /// Grant idempotency depends on `referral_pair_idx`.
    pub async fn initialize_indexes(&self) -> Result<(), DatabaseError> {
        let users = self.users();
        for (keys, name, unique) in [
            (doc! { "id": 1 }, "id_idx", true),
            (doc! { "email": 1 }, "email_idx", true),
            (doc! { "id": 1, "referred_by": 1 }, "id_referred_by_idx", false),
        ] {
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(unique)
                        .build(),
                )
                .build();
            users.create_index(index, None).await.map_err(|e| {
                tracing::error!("creating users index {} failed >>> {}", name, e);
                DatabaseError::ServerError
            })?;
        }

        let pair_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "referred_user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("referral_pair_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.referral_bonuses()
            .create_index(pair_index, None)
            .await
            .map_err(|e| {
                tracing::error!("creating referral pair index failed >>> {}", e);
                DatabaseError::ServerError
            })?;

        let history_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_timestamp_idx".to_string())
                    .build(),
            )
            .build();
        self.transaction_history()
            .create_index(history_index, None)
            .await
            .map_err(|e| {
                tracing::error!("creating transaction history index failed >>> {}", e);
                DatabaseError::ServerError
            })?;

        tracing::info!("mongodb indexes in place");
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            ..
        }))
    )
}

#[async_trait]
impl Store for MongoStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("mongodb ping failed >>> {}", e);
                DatabaseError::ServerError
            })?;
        Ok(())
    }

    async fn insert_user(&self, user: &UserDocument) -> Result<(), DatabaseError> {
        self.users().insert_one(user, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                return DatabaseError::Duplicate;
            }
            tracing::error!("creating user failed >>> {}", e);
            DatabaseError::ServerError
        })?;
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<UserDocument>, DatabaseError> {
        self.users()
            .find_one(doc! { "id": id.as_ref() }, None)
            .await
            .map_err(|e| {
                tracing::error!("get user by id failed >>> {}", e);
                DatabaseError::ServerError
            })
    }

    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserDocument>, DatabaseError> {
        self.users()
            .find_one(doc! { "email": email.as_ref() }, None)
            .await
            .map_err(|e| {
                tracing::error!("get user by email failed >>> {}", e);
                DatabaseError::ServerError
            })
    }

    async fn find_referred_user(
        &self,
        referred: &UserId,
        referrer: &UserId,
    ) -> Result<Option<UserDocument>, DatabaseError> {
        self.users()
            .find_one(
                doc! { "id": referred.as_ref(), "referred_by": referrer.as_ref() },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("get referred user failed >>> {}", e);
                DatabaseError::ServerError
            })
    }

    async fn increment_balance(
        &self,
        id: &UserId,
        amount: f64,
    ) -> Result<Option<f64>, DatabaseError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .users()
            .find_one_and_update(
                doc! { "id": id.as_ref() },
                doc! { "$inc": { "balance": amount } },
                options,
            )
            .await
            .map_err(|e| {
                tracing::error!("incrementing balance failed >>> {}", e);
                DatabaseError::ServerError
            })?;

        Ok(updated.map(|u| u.balance))
    }

    async fn find_bonus(
        &self,
        referrer: &UserId,
        referred: &UserId,
    ) -> Result<Option<ReferralBonusDocument>, DatabaseError> {
        self.referral_bonuses()
            .find_one(
                doc! { "user_id": referrer.as_ref(), "referred_user_id": referred.as_ref() },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("get referral bonus failed >>> {}", e);
                DatabaseError::ServerError
            })
    }

    async fn insert_bonus(&self, bonus: &ReferralBonusDocument) -> Result<(), DatabaseError> {
        self.referral_bonuses()
            .insert_one(bonus, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    return DatabaseError::Duplicate;
                }
                tracing::error!("recording referral bonus failed >>> {}", e);
                DatabaseError::ServerError
            })?;
        Ok(())
    }

    async fn delete_bonus(&self, id: &str) -> Result<(), DatabaseError> {
        self.referral_bonuses()
            .delete_one(doc! { "id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!("deleting referral bonus failed >>> {}", e);
                DatabaseError::ServerError
            })?;
        Ok(())
    }

    async fn insert_transaction(&self, entry: &TransactionDocument) -> Result<(), DatabaseError> {
        self.transaction_history()
            .insert_one(entry, None)
            .await
            .map_err(|e| {
                tracing::error!("appending transaction history failed >>> {}", e);
                DatabaseError::ServerError
            })?;
        Ok(())
    }

    async fn transactions_for(
        &self,
        owner: &UserId,
    ) -> Result<Vec<TransactionDocument>, DatabaseError> {
        let options = FindOptions::builder().sort(doc! { "timestamp": -1 }).build();
        let cursor = self
            .transaction_history()
            .find(doc! { "user_id": owner.as_ref() }, options)
            .await
            .map_err(|e| {
                tracing::error!("listing transaction history failed >>> {}", e);
                DatabaseError::ServerError
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("reading transaction history failed >>> {}", e);
            DatabaseError::ServerError
        })
    }

    async fn insert_status_check(
        &self,
        check: &StatusCheckDocument,
    ) -> Result<(), DatabaseError> {
        self.status_checks()
            .insert_one(check, None)
            .await
            .map_err(|e| {
                tracing::error!("recording status check failed >>> {}", e);
                DatabaseError::ServerError
            })?;
        Ok(())
    }

    async fn list_status_checks(
        &self,
        limit: i64,
    ) -> Result<Vec<StatusCheckDocument>, DatabaseError> {
        let options = FindOptions::builder().limit(limit).build();
        let cursor = self
            .status_checks()
            .find(doc! {}, options)
            .await
            .map_err(|e| {
                tracing::error!("listing status checks failed >>> {}", e);
                DatabaseError::ServerError
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("reading status checks failed >>> {}", e);
            DatabaseError::ServerError
        })
    }
}
