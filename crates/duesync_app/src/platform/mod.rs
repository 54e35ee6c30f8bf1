mod app;
mod cli;
mod config;
mod effects;
mod render;

pub use app::run_app;
