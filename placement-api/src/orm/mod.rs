pub mod company;
mod db;
pub mod login;
pub mod logout;
pub mod placement;
pub mod student;
pub mod testing;
pub mod user;

pub use db::*;
