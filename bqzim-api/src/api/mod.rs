//! HTTP API handlers for bqzim-api

pub mod accounts;
pub mod boq;
pub mod health;
pub mod predict;

pub use accounts::{account_routes, login, signup};
pub use boq::{bill_of_quantities, boq_routes};
pub use health::{health_check, health_routes};
pub use predict::{predict_house_details, predict_routes};
