pub mod task;

pub use task::{Task, TaskCreate, TaskListResponse, TaskQuery, TaskUpdate};
