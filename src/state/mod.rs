//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `ControllerState`: the pagination controller's page-loop state machine
//! - `RunStatus`: the outcome reported once the loop ends

mod controller_state;
mod run_status;

// Re-export main types
pub use controller_state::ControllerState;
pub use run_status::RunStatus;
