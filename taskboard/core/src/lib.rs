pub mod client;
pub mod task;

pub use task::{NewTask, OwnerId, Task, TaskError, TaskId, TaskPatch, TaskStatus};
