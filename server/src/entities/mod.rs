//! SeaORM entities backing the task store.
pub mod task;
