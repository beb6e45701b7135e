pub mod drop_repo;
pub use drop_repo::DropRepository;
pub mod realtor_repo;
pub use realtor_repo::RealtorRepository;
pub mod reference_repo;
pub use reference_repo::ReferenceRepository;
pub mod automation_repo;
pub use automation_repo::AutomationRepository;

pub mod store;
pub use store::{DeliveryStore, PgDeliveryStore};

#[cfg(test)]
pub mod memory_store;
