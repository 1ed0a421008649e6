mod connection;
mod protocol;
mod spawn;
