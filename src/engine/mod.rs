pub mod allocation;
pub mod dispatch;
pub mod eligibility;
pub mod responses;
pub mod views;
