//! Terminal task tracker: an in-memory task store, its JSON file, and the
//! interactive shell that drives them.

pub mod app;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;
pub mod task;
pub mod ui;

pub use error::{Error, Result};
pub use store::TaskStore;
pub use task::{NewTask, Priority, Status, Task, TaskPatch};
