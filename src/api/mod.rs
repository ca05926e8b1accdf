pub mod error;
pub mod extract;
pub mod filters;
pub mod handlers;
pub mod middleware;
pub mod payload;
pub mod permissions;
