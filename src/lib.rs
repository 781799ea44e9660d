// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod difficulty;
pub mod driver;
pub mod error;
pub mod level;
pub mod logging;
pub mod menu;
pub mod runtime;
pub mod scripted;
pub mod session;
pub mod terminal;
pub mod theme;
pub mod timeline;
pub mod ui;
