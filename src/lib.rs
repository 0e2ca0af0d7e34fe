pub mod app;
pub mod calculator;
pub mod catalog;
pub mod client;
pub mod config;
pub mod models;
pub mod parser;
pub mod store;
