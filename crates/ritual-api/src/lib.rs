pub mod auth;
pub mod convert;
pub mod error;
pub mod generate;
pub mod middleware;
pub mod plans;
pub mod practices;
pub mod ratings;
pub mod schedule;
pub mod slots;
