use serde::{Deserialize, Serialize};
use std::fmt::Display;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{StatusCheckDocument, TransactionDocument, UserDocument};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Username(String);

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Email(String);

impl From<String> for Email {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// A user as returned by the API; the password never leaves the store.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub balance: f64,
    pub referred_by: Option<UserId>,
}

impl From<UserDocument> for User {
    fn from(value: UserDocument) -> Self {
        Self {
            id: value.id,
            username: value.username,
            email: value.email,
            balance: value.balance,
            referred_by: value.referred_by,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<StatusCheckDocument> for StatusCheck {
    fn from(value: StatusCheckDocument) -> Self {
        Self {
            id: value.id,
            client_name: value.client_name,
            timestamp: value.timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Transaction {
    pub id: String,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub balance_after: f64,
}

impl From<TransactionDocument> for Transaction {
    fn from(value: TransactionDocument) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            kind: value.kind,
            amount: value.amount,
            description: value.description,
            timestamp: value.timestamp,
            balance_after: value.balance_after,
        }
    }
}
