pub mod admin;
pub mod auth;
pub mod basket;
pub mod catalog;
pub mod favorites;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
