pub mod artifact;
pub mod command;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod index;
pub mod manager;
pub mod params;
pub mod requirement;
pub mod resolver;
pub mod scope;
pub mod transaction;
pub mod version;
