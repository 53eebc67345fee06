pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod plugins;
pub mod replay;
pub mod report;
pub mod state;
pub mod term;
pub mod time;
pub mod tracer;
pub mod utils;

pub use config::Settings;
pub use replay::{StreamEvent, replay};
pub use state::ExitStatus;
pub use tracer::Tracer;
