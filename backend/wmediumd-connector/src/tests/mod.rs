mod config;
mod discovery;
mod ledger;
mod logger;
mod protocol;
