pub mod aggregate;
pub mod decoder;
pub mod summary;
pub mod trend;
