pub mod auth;
pub mod dashboard;
pub mod drops;
pub mod health;
pub mod maps;
pub mod realtors;
pub mod reference;
pub mod routes;
