#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unsafe_code)]

pub mod commands;
pub mod parser;

pub use commands::{Commands, FloorCommand, run};
pub use parser::Cli;
