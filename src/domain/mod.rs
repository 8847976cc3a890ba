pub mod error;
pub mod repository;
pub mod todo;
pub mod user;
pub mod validation;
