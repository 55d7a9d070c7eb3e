mod config;
mod timestamp;
