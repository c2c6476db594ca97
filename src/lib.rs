pub mod app;
pub mod config;
pub mod conversation;
pub mod i18n;
pub mod store;
pub mod ui;
