//! An in-memory task server, for tests
//!
//! It enforces the same visibility and permission rules as the real server, so that tests can exercise rejections.
#![cfg(any(test, feature = "mock_api"))]

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::ApiError;
use crate::mock_behaviour::MockBehaviour;
use crate::session::{Authority, Me};
use crate::task::{NewTask, Priority, Task, TaskStatus};
use crate::traits::TaskApi;
use crate::user::{NewUser, Role, UserRef, UserUpdate};

/// The password of every seeded account
pub const DEFAULT_PASSWORD: &str = "password";

struct Account {
    user: UserRef,
    password: String,
}

struct MockState {
    accounts: Vec<Account>,
    tasks: Vec<Task>,
    logged_in: Option<i64>,
    next_id: i64,
    clock: NaiveDateTime,
    behaviour: MockBehaviour,
    calls: Vec<&'static str>,
}

/// A [`TaskApi`] that keeps everything in memory
pub struct MockApi {
    state: Mutex<MockState>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// A server with the three default accounts: `admin`, `manager` and `user` (ids 1, 2 and 3), all with [`DEFAULT_PASSWORD`]
    pub fn new() -> Self {
        let seed = |id: i64, name: &str, role: Role| Account {
            user: UserRef::new(id, name.to_string(), role, Some(format!("{}@example.com", name)), None),
            password: DEFAULT_PASSWORD.to_string(),
        };
        let clock = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap_or_default();

        Self {
            state: Mutex::new(MockState {
                accounts: vec![
                    seed(1, "admin", Role::Admin),
                    seed(2, "manager", Role::Manager),
                    seed(3, "user", Role::User),
                ],
                tasks: Vec::new(),
                logged_in: None,
                next_id: 100,
                clock,
                behaviour: MockBehaviour::default(),
                calls: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a session without going through `login`
    pub fn log_in_as(&self, username: &str) {
        let mut state = self.state();
        state.logged_in = state.accounts.iter().find(|a| a.user.username() == username).map(|a| a.user.id());
    }

    /// Add a user, managed by `manager_id` if any
    pub fn add_user(&self, username: &str, role: Role, manager_id: Option<i64>) -> UserRef {
        let mut state = self.state();
        let manager = manager_id.and_then(|id| state.user(id));
        let id = state.next_id();
        let user = UserRef::new(id, username.to_string(), role, None, manager);
        state.accounts.push(Account { user: user.clone(), password: DEFAULT_PASSWORD.to_string() });
        user
    }

    /// Add a task as if `creator_id` had created it at `created_date`
    pub fn add_task(&self, title: &str, status: TaskStatus, priority: Priority, created_date: NaiveDateTime, creator_id: i64, assignee_id: Option<i64>) -> Task {
        let mut state = self.state();
        let id = state.next_id();
        let mut task = Task::new(id, title.to_string(), priority, status, created_date);
        if let Some(creator) = state.user(creator_id) {
            task = task.with_creator(creator);
        }
        let assignee = assignee_id.or(Some(creator_id)).and_then(|id| state.user(id));
        task = task.with_assignee(assignee);
        state.tasks.push(task.clone());
        task
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.state().behaviour = behaviour;
    }

    /// Every task on the server, regardless of who is logged in
    pub fn tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    pub fn users(&self) -> Vec<UserRef> {
        self.state().accounts.iter().map(|a| a.user.clone()).collect()
    }

    /// The names of the operations that have been called so far
    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<UserRef> {
        self.accounts.iter().find(|a| a.user.id() == id).map(|a| a.user.clone())
    }

    fn call(&mut self, name: &'static str) {
        self.calls.push(name);
    }

    fn current_user(&self) -> Result<UserRef, ApiError> {
        self.logged_in
            .and_then(|id| self.user(id))
            .ok_or_else(|| ApiError::rejected(401, r#"{"error":"Unauthorized"}"#))
    }

    fn require_role(&self, roles: &[Role]) -> Result<UserRef, ApiError> {
        let me = self.current_user()?;
        if roles.contains(&me.role()) {
            Ok(me)
        } else {
            Err(ApiError::rejected(403, r#"{"error":"Forbidden"}"#))
        }
    }

    fn is_visible(&self, task: &Task, viewer: &UserRef) -> bool {
        let involves = |user_id: Option<i64>| user_id.map(|id| id == viewer.id()).unwrap_or(false);
        let managed = |user_id: Option<i64>| user_id
            .and_then(|id| self.user(id))
            .map(|u| u.is_managed_by(viewer.id()))
            .unwrap_or(false);

        match viewer.role() {
            Role::Admin => true,
            Role::Manager => involves(task.create_user_id()) || involves(task.assigned_user_id())
                || managed(task.create_user_id()) || managed(task.assigned_user_id()),
            Role::User => involves(task.create_user_id()) || involves(task.assigned_user_id()),
        }
    }

    fn is_managed_target(&self, target: &UserRef, modifier: &UserRef) -> bool {
        modifier.role() == Role::Admin || target.is_managed_by(modifier.id())
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::Rejected { status: 400, message: message.to_string() }
}

fn csv_field(text: &str) -> String {
    let flat = text.replace(|c| c == '\n' || c == '\r', " ");
    if flat.contains(',') || flat.contains('"') {
        format!("\"{}\"", flat.replace('"', "\"\""))
    } else {
        flat
    }
}

#[async_trait]
impl TaskApi for MockApi {
    async fn me(&self) -> Result<Me, ApiError> {
        let mut state = self.state();
        state.call("me");
        state.behaviour.can_me()?;
        let me = state.current_user()?;
        Ok(Me {
            username: Some(me.username().to_string()),
            roles: vec![Authority::Object { authority: me.role().authority() }],
        })
    }

    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let mut state = self.state();
        state.call("login");
        state.behaviour.can_login()?;
        let found = state.accounts.iter()
            .find(|a| a.user.username() == username && a.password == password)
            .map(|a| a.user.id());
        match found {
            Some(id) => {
                state.logged_in = Some(id);
                Ok(())
            },
            None => Err(ApiError::Rejected { status: 401, message: "Invalid username or password".to_string() }),
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let mut state = self.state();
        state.call("logout");
        state.logged_in = None;
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let mut state = self.state();
        state.call("list_tasks");
        state.behaviour.can_list_tasks()?;
        let me = state.current_user()?;
        Ok(state.tasks.iter().filter(|t| state.is_visible(t, &me)).cloned().collect())
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        let mut state = self.state();
        state.call("create_task");
        state.behaviour.can_create_task()?;
        let me = state.current_user()?;

        let assignee_id = new_task.assigned_user_id.unwrap_or_else(|| me.id());
        let assignee = state.user(assignee_id).ok_or_else(|| bad_request("Assignee not found"))?;
        if assignee_id != me.id() {
            match me.role() {
                Role::User => return Err(bad_request("Users can only assign tasks to themselves.")),
                Role::Manager if !assignee.is_managed_by(me.id()) => {
                    return Err(bad_request("Managers can only assign tasks to their own users."))
                },
                _ => {},
            }
        }

        let id = state.next_id();
        state.clock = state.clock + Duration::minutes(1);
        let priority = new_task.priority.map(Priority::new).unwrap_or_else(Priority::none);
        let description = Some(new_task.description.clone()).filter(|d| !d.is_empty());
        let task = Task::new(id, new_task.title.clone(), priority, TaskStatus::Pending, state.clock)
            .with_description(description)
            .with_creator(me)
            .with_assignee(Some(assignee));
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        let mut state = self.state();
        state.call("delete_task");
        state.behaviour.can_delete_task()?;
        let me = state.current_user()?;

        let position = state.tasks.iter().position(|t| t.id() == id)
            .ok_or_else(|| ApiError::rejected(404, r#"{"message":"Task not found"}"#))?;
        let task = &state.tasks[position];
        if me.role() != Role::Admin && task.create_user_id() != Some(me.id()) {
            return Err(ApiError::rejected(403, r#"{"status":403,"error":"Forbidden","message":"Only Admin or the Task Creator can delete this task."}"#));
        }
        state.tasks.remove(position);
        Ok(())
    }

    async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError> {
        let mut state = self.state();
        state.call("set_task_status");
        state.behaviour.can_set_task_status()?;
        state.require_role(&[Role::Admin, Role::Manager])?;

        let task = state.tasks.iter_mut().find(|t| t.id() == id)
            .ok_or_else(|| ApiError::rejected(404, r#"{"message":"Task not found"}"#))?;
        task.set_status(status);
        Ok(task.clone())
    }

    async fn export_tasks(&self) -> Result<Vec<u8>, ApiError> {
        let mut state = self.state();
        state.call("export_tasks");
        state.behaviour.can_export_tasks()?;
        let me = state.current_user()?;

        let mut csv = String::from("\u{feff}Task ID,Title,Description,Status,Priority,Assigned User,Created Date\n");
        for task in state.tasks.iter().filter(|t| state.is_visible(t, &me)) {
            csv.push_str(&format!("{},{},{},{},{},{},{}\n",
                task.id(),
                csv_field(task.title()),
                csv_field(task.description().unwrap_or("")),
                task.status(),
                task.priority(),
                task.assigned_user().map(|u| csv_field(u.username())).unwrap_or_else(|| "Unassigned".to_string()),
                task.created_date().format("%Y-%m-%dT%H:%M:%S"),
            ));
        }
        Ok(csv.into_bytes())
    }

    async fn list_users(&self) -> Result<Vec<UserRef>, ApiError> {
        let mut state = self.state();
        state.call("list_users");
        state.behaviour.can_list_users()?;
        let me = state.require_role(&[Role::Admin, Role::Manager])?;
        Ok(state.accounts.iter()
            .map(|a| &a.user)
            .filter(|u| me.role() == Role::Admin || u.is_managed_by(me.id()))
            .cloned()
            .collect())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<UserRef, ApiError> {
        let mut state = self.state();
        state.call("create_user");
        state.behaviour.can_write_user()?;
        let me = state.require_role(&[Role::Admin, Role::Manager])?;

        if state.accounts.iter().any(|a| a.user.username() == new_user.username) {
            return Err(bad_request("Username already exists"));
        }
        let manager = match (me.role(), new_user.role) {
            (Role::Manager, Role::User) => Some(me),
            (Role::Manager, _) => return Err(bad_request("Managers can only create User role.")),
            (_, Role::Admin) => return Err(bad_request("Admins cannot create other Admins.")),
            _ => None,
        };

        let id = state.next_id();
        let email = Some(new_user.email.clone()).filter(|e| !e.is_empty());
        let user = UserRef::new(id, new_user.username.clone(), new_user.role, email, manager);
        state.accounts.push(Account { user: user.clone(), password: new_user.password.clone() });
        Ok(user)
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserRef, ApiError> {
        let mut state = self.state();
        state.call("update_user");
        state.behaviour.can_write_user()?;
        let me = state.require_role(&[Role::Admin, Role::Manager])?;

        let position = state.accounts.iter().position(|a| a.user.id() == id)
            .ok_or_else(|| bad_request("User not found"))?;
        if !state.is_managed_target(&state.accounts[position].user, &me) {
            return Err(bad_request("Managers can only update their own users."));
        }

        let account = &mut state.accounts[position];
        if !update.email.is_empty() {
            let user = &account.user;
            account.user = UserRef::new(user.id(), user.username().to_string(), user.role(), Some(update.email.clone()), user.manager().cloned());
        }
        if !update.password.is_empty() {
            account.password = update.password.clone();
        }
        Ok(account.user.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        let mut state = self.state();
        state.call("delete_user");
        state.behaviour.can_write_user()?;
        let me = state.require_role(&[Role::Admin, Role::Manager])?;

        let position = state.accounts.iter().position(|a| a.user.id() == id)
            .ok_or_else(|| bad_request("User not found"))?;
        if !state.is_managed_target(&state.accounts[position].user, &me) {
            return Err(bad_request("Managers can only delete their own users."));
        }
        if state.tasks.iter().any(|t| t.assigned_user_id() == Some(id)) {
            return Err(ApiError::rejected(400, r#"{"message":"Cannot delete user/manager with at least 1 task assigned"}"#));
        }
        state.accounts.remove(position);
        Ok(())
    }
}
