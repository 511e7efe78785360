pub mod config;
pub mod models;
pub mod prices;
pub mod store;
pub mod sync;
