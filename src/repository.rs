pub mod memory_repository;
pub mod models;
pub mod repository;
pub mod sqlite_repository;

pub use memory_repository::*;
pub use repository::*;
pub use sqlite_repository::*;
