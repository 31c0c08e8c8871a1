mod task;

pub use task::{Reminder, Task};
