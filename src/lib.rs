//! label-relay — asynchronous image-labeling reply pipeline.
//!
//! Webhook → receive → "to-process" topic → process → "to-send" topic →
//! send → reply endpoint. State never flows backward.

pub mod broker;
pub mod config;
pub mod error;
pub mod gcp;
pub mod line;
pub mod pipeline;
pub mod secrets;
pub mod server;
pub mod vision;
