pub mod db;
pub mod models;
mod tables;
mod uploads;
mod users;

pub use db::{Database, DatabaseError};
pub use tables::*;
