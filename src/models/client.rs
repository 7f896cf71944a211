use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
    Expired,
}

/// Client profile wrapping a user with the client role
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: Option<String>,
    pub subscription_start: Option<NaiveDate>,
    pub subscription_end: Option<NaiveDate>,
    pub goals: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn has_active_subscription(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Active
    }

    pub fn is_linked_to(&self, trainer_id: Uuid) -> bool {
        self.trainer_id == Some(trainer_id)
    }
}

/// Client joined with its user and trainer names, as listed to staff
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientProfile {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub client: Client,
    pub name: String,
    pub email: String,
    pub trainer_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    /// Only clients without a trainer (the pool trainers claim from)
    pub unassigned: Option<bool>,
    pub trainer_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(max = 5000))]
    pub goals: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignTrainerRequest {
    pub trainer_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSubscriptionRequest {
    pub status: SubscriptionStatus,
    #[validate(length(max = 100))]
    pub plan: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl UpdateSubscriptionRequest {
    /// Checks the dates the row will hold once unsent fields keep their stored values
    pub fn check_range(&self, stored: &Client) -> Result<(), String> {
        let start = self.start_date.or(stored.subscription_start);
        let end = self.end_date.or(stored.subscription_end);
        match (start, end) {
            (Some(start), Some(end)) if end < start => {
                Err("Subscription end date is before its start date".to_string())
            }
            _ => Ok(()),
        }
    }
}
