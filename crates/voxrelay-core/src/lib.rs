//! voxrelay core — config, shared wire types, and mode selection.

pub mod config;
pub mod mode;
pub mod types;
pub mod utils;

pub use mode::{active_model, select_mode};
pub use types::{ActiveMode, ChatRequest, ChatResponse, ErrorEnvelope, HealthReport};
