pub mod auth;
pub mod automation;
pub mod dashboard;
pub mod drops;
pub mod realtors;
pub mod reference;
pub mod routes;
