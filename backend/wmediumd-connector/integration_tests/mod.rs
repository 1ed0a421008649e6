mod config;
mod discovery;
mod error;
mod helpers;
mod manager;
