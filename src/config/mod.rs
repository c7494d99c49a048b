//! Process configuration from the environment.

mod app;

pub use app::*;
