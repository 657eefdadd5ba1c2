//! Documents as they are stored in the `users`, `referral_bonuses`,
//! `transaction_history` and `status_checks` collections.
//!
//! Instants are stored as BSON dates so the store orders them
//! chronologically.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::fields::{Email, UserId, Username};

pub const REFERRAL_BONUS_TRANSACTION: &str = "referral_bonus";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDocument {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub password: String,
    pub balance: f64,
    pub referred_by: Option<UserId>,
}

impl UserDocument {
    pub fn new(
        username: Username,
        email: Email,
        password: String,
        starting_balance: f64,
        referred_by: Option<UserId>,
    ) -> Self {
        Self {
            id: UserId::generate(),
            username,
            email,
            password,
            balance: starting_balance,
            referred_by,
        }
    }
}

/// Ledger record proving a referral pair has been paid. Unique on
/// `(user_id, referred_user_id)`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReferralBonusDocument {
    pub id: String,
    pub user_id: UserId,
    pub referred_user_id: UserId,
    pub bonus_amount: f64,
    #[serde(with = "bson_datetime")]
    pub timestamp: OffsetDateTime,
}

impl ReferralBonusDocument {
    pub fn new(referrer: &UserId, referred: &UserId, bonus_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: referrer.clone(),
            referred_user_id: referred.clone(),
            bonus_amount,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransactionDocument {
    pub id: String,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub description: String,
    #[serde(with = "bson_datetime")]
    pub timestamp: OffsetDateTime,
    pub balance_after: f64,
}

impl TransactionDocument {
    pub fn referral_bonus(
        owner: &UserId,
        referred: &UserId,
        amount: f64,
        balance_after: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: owner.clone(),
            kind: REFERRAL_BONUS_TRANSACTION.to_string(),
            amount,
            description: format!("Referral bonus for user {}", referred),
            timestamp: OffsetDateTime::now_utc(),
            balance_after,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusCheckDocument {
    pub id: String,
    pub client_name: String,
    #[serde(with = "bson_datetime")]
    pub timestamp: OffsetDateTime,
}

impl StatusCheckDocument {
    pub fn new(client_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_name,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

mod bson_datetime {
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let millis = (value.unix_timestamp_nanos() / 1_000_000) as i64;
        bson::DateTime::from_millis(millis).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let value = bson::DateTime::deserialize(deserializer)?;
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(value.timestamp_millis()) * 1_000_000)
            .map_err(serde::de::Error::custom)
    }
}
