pub mod cli;
mod commands;
pub mod ui;
