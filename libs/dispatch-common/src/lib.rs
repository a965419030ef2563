pub mod catalog;
pub mod client;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod service;
pub mod store;
pub mod types;
pub mod worklist;
