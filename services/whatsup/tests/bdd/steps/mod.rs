//! BDD step definitions for whatsup

pub mod notification_steps;
pub mod run_steps;
pub mod store_steps;
