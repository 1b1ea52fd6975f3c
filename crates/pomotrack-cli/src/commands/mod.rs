pub mod config;
pub mod settings;
pub mod stats;
pub mod theme;
pub mod timer;
