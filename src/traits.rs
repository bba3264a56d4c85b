use async_trait::async_trait;

use crate::error::ApiError;
use crate::session::Me;
use crate::task::{NewTask, Task, TaskStatus};
use crate::user::{NewUser, UserRef, UserUpdate};

/// The REST surface of a task server.
///
/// Every operation maps to exactly one request. Nothing is retried, and failures are always returned, never panicked on.
#[async_trait]
pub trait TaskApi {
    /// Ask the server who we are
    async fn me(&self) -> Result<Me, ApiError>;
    /// Open a session with the server
    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError>;
    /// Close the current session
    async fn logout(&self) -> Result<(), ApiError>;

    /// Returns every task the current user is allowed to see
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError>;
    async fn delete_task(&self, id: i64) -> Result<(), ApiError>;
    /// Approve or reject a task
    async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError>;
    /// Returns the CSV export of the visible tasks, as raw bytes
    async fn export_tasks(&self) -> Result<Vec<u8>, ApiError>;

    /// Returns the users the current user manages (the server filters them)
    async fn list_users(&self) -> Result<Vec<UserRef>, ApiError>;
    async fn create_user(&self, user: &NewUser) -> Result<UserRef, ApiError>;
    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserRef, ApiError>;
    async fn delete_user(&self, id: i64) -> Result<(), ApiError>;
}
