pub mod admin;
pub mod auth;
pub mod exercises;
pub mod routines;
pub mod users;
