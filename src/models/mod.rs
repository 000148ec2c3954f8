//! Request and response models

pub mod gee;

pub use gee::*;
