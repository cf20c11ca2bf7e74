use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Service category of a booking, also used as the package tier a driver
/// subscribes to. `PremiumAll` is the catch-all tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceCategory {
    Local,
    Outstation,
    PremiumAll,
}

impl ServiceCategory {
    /// Whether a driver subscribed to `self` may receive a booking of `requested`.
    pub fn covers(self, requested: ServiceCategory) -> bool {
        self == requested || self == ServiceCategory::PremiumAll
    }
}

impl FromStr for ServiceCategory {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "local" => Ok(ServiceCategory::Local),
            "outstation" => Ok(ServiceCategory::Outstation),
            "premiumall" | "all" => Ok(ServiceCategory::PremiumAll),
            _ => Err(AppError::InvalidCategory(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReviewStatus {
    Unreviewed,
    Reviewed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DispatchState {
    NotSent,
    Sent,
    Allocated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer_name: String,
    pub category: ServiceCategory,
    pub pickup: String,
    pub dropoff: String,
    pub region: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub fare_estimate: f64,
    pub review_status: ReviewStatus,
    pub selected_package_type: Option<ServiceCategory>,
    pub dispatch_state: DispatchState,
    pub allocated_driver_id: Option<Uuid>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        customer_name: String,
        category: ServiceCategory,
        pickup: String,
        dropoff: String,
        scheduled_at: DateTime<Utc>,
        fare_estimate: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_name,
            category,
            pickup,
            dropoff,
            region: None,
            scheduled_at,
            fare_estimate,
            review_status: ReviewStatus::Unreviewed,
            selected_package_type: None,
            dispatch_state: DispatchState::NotSent,
            allocated_driver_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn is_allocated(&self) -> bool {
        self.dispatch_state == DispatchState::Allocated
    }

    /// Marks a committed mutation.
    pub(crate) fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> BookingSummary {
        BookingSummary {
            id: self.id,
            category: self.category,
            pickup: self.pickup.clone(),
            dropoff: self.dropoff.clone(),
            scheduled_at: self.scheduled_at,
            fare_estimate: self.fare_estimate,
        }
    }
}

/// Display fields a respondent sees for an offered booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSummary {
    pub id: Uuid,
    pub category: ServiceCategory,
    pub pickup: String,
    pub dropoff: String,
    pub scheduled_at: DateTime<Utc>,
    pub fare_estimate: f64,
}
