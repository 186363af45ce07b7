pub mod models;
pub mod services;
pub mod store;

pub use models::*;
pub use services::*;
pub use store::{ConstraintKind, InMemoryStore, SchedulingStore, StoreError};
