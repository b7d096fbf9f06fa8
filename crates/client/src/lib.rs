pub mod config;
pub mod connection;
pub mod countdown;
pub mod input;
pub mod runtime;
pub mod terminal;
