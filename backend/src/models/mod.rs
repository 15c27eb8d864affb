pub mod common;
pub mod shift;
pub mod user;
