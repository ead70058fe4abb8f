pub mod catalog;
pub mod catalog_csv;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod service;
pub mod session;
pub mod totals;
pub mod views;

pub use error::{Error, ErrorKind, Result};
pub use service::DietService;
