//! Service layer
//!
//! Services compose the alert engine with delivery.

pub mod alert_service;

pub use alert_service::AlertService;
