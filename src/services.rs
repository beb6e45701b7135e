pub mod auth;
pub mod dashboard_service;
pub mod drop_service;
pub mod duplicate_guard;
pub mod maps_service;
pub mod realtor_service;
pub mod reference_service;
pub mod route_service;
