//! Command-line interface handlers

pub mod commands;

pub use commands::{
    cmd_mine, cmd_validate, cmd_winners, parse_time_arg, CliResult, MineCommand,
    DEFAULT_WINNER_COUNT,
};
