//! HTTP handlers

pub mod health;
pub mod gee;
pub mod predict;
