pub mod auth;
pub mod catalog;
pub mod follows;
pub mod health;
pub mod users;
