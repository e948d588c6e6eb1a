pub mod comparator_service;
pub mod fixtures;
