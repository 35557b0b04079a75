pub mod auth;
pub mod content;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod repos;
pub mod social;
