#![doc = include_str!("../README.md")]

pub mod groundedness;
pub mod models;
pub mod moderation;
pub mod prompt_shield;
pub mod text_analysis;

pub use moderation::ModerationClient;
