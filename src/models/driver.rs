use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::ServiceCategory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RespondentRole {
    Driver,
    Lead,
}

/// Anyone who can receive and answer a booking offer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Respondent {
    pub id: Uuid,
    pub role: RespondentRole,
}

/// Directory record for a driver or lead. Owned by the directory; the workflow
/// only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle: Option<String>,
    pub role: RespondentRole,
    pub package: Option<ServiceCategory>,
    pub online: bool,
    pub region: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn respondent(&self) -> Respondent {
        Respondent {
            id: self.id,
            role: self.role,
        }
    }

    pub fn profile(&self) -> DriverProfile {
        DriverProfile {
            id: self.id,
            name: self.name.clone(),
            phone: self.phone.clone(),
            vehicle: self.vehicle.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverProfile {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle: Option<String>,
    pub role: RespondentRole,
}
