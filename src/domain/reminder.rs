use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PhoneNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderId(Uuid);

impl ReminderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

/// Scheduled notification swept periodically by the reminder worker.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: ReminderId,
    pub owner_phone: PhoneNumber,
    pub body: String,
    pub remind_at: DateTime<Utc>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(owner_phone: PhoneNumber, body: String, remind_at: DateTime<Utc>) -> Self {
        Self {
            id: ReminderId::new(),
            owner_phone,
            body,
            remind_at,
            sent: false,
            created_at: Utc::now(),
        }
    }
}
