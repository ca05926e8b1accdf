pub mod account_service;
pub mod follow_service;
pub mod token_service;
pub mod worker;
