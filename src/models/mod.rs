pub mod booking;
pub mod driver;
pub mod notification;
pub mod slot;
