pub mod args;
pub mod commands;

pub use args::{CitySource, Cli, Commands, OutputFormat};
pub use commands::{init_logging, run};
