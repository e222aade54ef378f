pub mod catalog;
pub mod location;
pub mod pagination;
pub mod settings;
pub mod stats;
pub mod trip;
pub mod user;
