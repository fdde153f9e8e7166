//! Port traits for the collaborators around the detection engine.

pub mod config_port;
pub mod data_port;
pub mod event_port;
