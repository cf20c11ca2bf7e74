use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::Respondent;

/// Outbound events for the external notifier. Sent after the owning mutation
/// has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Offered {
        slot_id: Uuid,
        booking_id: Uuid,
        respondent: Respondent,
    },
    Allocated {
        booking_id: Uuid,
        driver_id: Uuid,
        closed_slots: usize,
    },
}
