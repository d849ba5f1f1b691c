//! Shared configuration for the multi-view dataset tools

pub mod camera;
pub mod catalog;
pub mod layout;
pub mod render_settings;
