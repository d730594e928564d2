mod commands;

pub use commands::{is_exit_command, parse_weight_override, Cli, Commands};
