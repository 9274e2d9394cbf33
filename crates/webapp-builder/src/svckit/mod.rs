//! Builtin tool implementations

pub mod shell;
pub mod weather;

pub use shell::ShellTool;
pub use weather::WeatherTool;
