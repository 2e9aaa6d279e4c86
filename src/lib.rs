pub mod access;
pub mod api;
pub mod board;
pub mod commands;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod feeds;
pub mod state;
pub mod table;
