pub mod audio;
pub mod auth;
pub mod config;
pub mod event;
pub mod http;
pub mod location;
pub mod profile;
pub mod state;
pub mod ui;
pub mod util;
