//! CLI command modules

pub mod boot;
pub mod events;
pub mod health;
pub mod list;
pub mod publish;
