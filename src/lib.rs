pub mod app;
pub mod capability;
pub mod config;
pub mod host;
pub mod page;
pub mod progress;
pub mod render;
pub mod scroll;
pub mod surface;
pub mod terminal;
pub mod typography;
pub mod visual;
