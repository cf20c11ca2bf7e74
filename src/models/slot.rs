use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::Respondent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SlotStatus {
    Pending,
    Accepted,
    Rejected,
    Allocated,
    Closed,
}

impl SlotStatus {
    /// Position in the partial order Pending < {Accepted, Rejected} < {Allocated, Closed}.
    pub fn rank(self) -> u8 {
        match self {
            SlotStatus::Pending => 0,
            SlotStatus::Accepted | SlotStatus::Rejected => 1,
            SlotStatus::Allocated | SlotStatus::Closed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SlotStatus::Rejected | SlotStatus::Allocated | SlotStatus::Closed
        )
    }

    pub fn can_transition_to(self, next: SlotStatus) -> bool {
        matches!(
            (self, next),
            (SlotStatus::Pending, SlotStatus::Accepted)
                | (SlotStatus::Pending, SlotStatus::Rejected)
                | (SlotStatus::Pending, SlotStatus::Closed)
                | (SlotStatus::Accepted, SlotStatus::Allocated)
                | (SlotStatus::Accepted, SlotStatus::Closed)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResponseAction {
    #[serde(alias = "accept", alias = "ACCEPT")]
    Accept,
    #[serde(alias = "reject", alias = "REJECT")]
    Reject,
}

impl ResponseAction {
    pub fn target(self) -> SlotStatus {
        match self {
            ResponseAction::Accept => SlotStatus::Accepted,
            ResponseAction::Reject => SlotStatus::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseAction::Accept => "accept",
            ResponseAction::Reject => "reject",
        }
    }
}

/// One respondent's opportunity to answer a dispatched booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSlot {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub respondent: Respondent,
    pub status: SlotStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ResponseSlot {
    pub fn new(booking_id: Uuid, respondent: Respondent) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            respondent,
            status: SlotStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
            resolved_at: None,
        }
    }

    /// Moves the slot forward. Returns the current status unchanged on an
    /// illegal transition.
    pub(crate) fn advance(&mut self, next: SlotStatus) -> Result<(), SlotStatus> {
        if !self.status.can_transition_to(next) {
            return Err(self.status);
        }

        let now = Utc::now();
        match next {
            SlotStatus::Accepted | SlotStatus::Rejected => self.responded_at = Some(now),
            _ => self.resolved_at = Some(now),
        }
        self.status = next;
        Ok(())
    }
}
