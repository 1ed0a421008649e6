mod autostart;
mod lifecycle;
mod operations;
