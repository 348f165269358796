//! SeaORM entities.

pub mod diary;
pub mod notification;
pub mod site_config;
pub mod user;
