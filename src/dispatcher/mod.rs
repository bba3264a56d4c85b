//! This module owns the whole client state, and runs user commands against a [`TaskApi`]
//!
//! Everything the UI shows is derived from a [`Dispatcher`]: the session, the fetched tasks and users, the list criteria and the calendar week.
//! All of them are changed through named methods, so that the state machine can be driven (and tested) without any UI.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::calendar::{self, Week, WeekAnchor};
use crate::collection::{SortKey, StatusFilter, TaskCollection};
use crate::config;
use crate::error::{ApiError, CommandError};
use crate::session::Session;
use crate::task::{NewTask, Task, TaskStatus};
use crate::traits::TaskApi;
use crate::user::{NewUser, UserRef, UserUpdate};

pub mod command_progress;
pub mod sequence;

use command_progress::{CommandProgress, FeedbackSender};
use sequence::{Fetched, InFlight, InFlightGuard, RequestSequencer, Ticket};

/// The user commands a [`Dispatcher`] runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Login,
    Logout,
    CreateTask,
    DeleteTask,
    SetTaskStatus,
    ExportTasks,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::CreateTask => "create task",
            Self::DeleteTask => "delete task",
            Self::SetTaskStatus => "set task status",
            Self::ExportTasks => "export tasks",
            Self::CreateUser => "create user",
            Self::UpdateUser => "update user",
            Self::DeleteUser => "delete user",
        };
        write!(f, "{}", name)
    }
}

/// Where a command is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandState {
    Idle,
    Submitting,
}

/// Which rendering of the tasks is shown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Calendar,
}

/// What an identity probe found out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    LoggedIn,
    LoggedOut,
}

/// One entry of the "assign to" list
#[derive(Clone, Debug, PartialEq)]
pub struct Assignee {
    /// `None` stands for the current user
    pub user_id: Option<i64>,
    pub label: String,
}

/// The controller of the client: it owns the state, and runs the commands
pub struct Dispatcher<A: TaskApi> {
    api: A,
    session: Session,
    tasks: TaskCollection,
    users: Vec<UserRef>,
    anchor: WeekAnchor,
    view: ViewMode,

    sequencer: RequestSequencer,
    in_flight: InFlight,
    progress: CommandProgress,
}

impl<A: TaskApi> Dispatcher<A> {
    /// Create a dispatcher. This does not send any request. The calendar shows the current week
    pub fn new(api: A) -> Self {
        Self {
            api,
            session: Session::anonymous(),
            tasks: TaskCollection::new(),
            users: Vec::new(),
            anchor: WeekAnchor::containing(today()),
            view: ViewMode::List,
            sequencer: RequestSequencer::new(),
            in_flight: InFlight::new(),
            progress: CommandProgress::new(),
        }
    }

    /// Create a dispatcher that reports the progress of its commands to `feedback_sender`
    pub fn new_with_feedback_channel(api: A, feedback_sender: FeedbackSender) -> Self {
        let mut dispatcher = Self::new(api);
        dispatcher.progress = CommandProgress::new_with_feedback_channel(feedback_sender);
        dispatcher
    }

    pub fn api(&self) -> &A { &self.api }
    pub fn session(&self) -> &Session { &self.session }
    pub fn tasks(&self) -> &TaskCollection { &self.tasks }
    /// The users of the last user fetch (empty unless the session can manage users)
    pub fn users(&self) -> &[UserRef] { &self.users }
    pub fn anchor(&self) -> &WeekAnchor { &self.anchor }
    pub fn view(&self) -> ViewMode { self.view }

    pub fn command_state(&self, kind: CommandKind) -> CommandState {
        if self.in_flight.is_active(kind) {
            CommandState::Submitting
        } else {
            CommandState::Idle
        }
    }

    //
    // Session
    //

    /// Ask the server who we are, and update the session accordingly.
    ///
    /// Failures are not errors here: they just mean we are logged out.
    pub async fn probe(&mut self) -> ProbeOutcome {
        let session = match self.api.me().await {
            Ok(me) => Session::from_me(me),
            Err(err) => {
                log::info!("Identity probe failed ({}), considering we are logged out", err);
                Session::anonymous()
            },
        };

        match session.identity() {
            Some(identity) => log::info!("Logged in as {} ({:?})", identity.username(), session.primary_role()),
            None => self.clear_data(),
        }
        self.session = session;

        if self.session.is_authenticated() {
            ProbeOutcome::LoggedIn
        } else {
            ProbeOutcome::LoggedOut
        }
    }

    /// The fetches that follow a probe: tasks always, users only when the session may manage them
    pub async fn after_probe(&mut self) -> Result<(), ApiError> {
        if self.session.is_authenticated() == false {
            return Ok(());
        }
        let tasks_result = self.refresh_tasks().await;
        if self.session.can_manage_users() {
            self.refresh_users().await?;
        }
        tasks_result
    }

    /// Probe the identity, then fetch what this identity may see
    pub async fn start(&mut self) -> Result<ProbeOutcome, ApiError> {
        let outcome = self.probe().await;
        self.after_probe().await?;
        Ok(outcome)
    }

    fn clear_data(&mut self) {
        self.sequencer.invalidate(Fetched::Tasks);
        self.sequencer.invalidate(Fetched::Users);
        self.tasks.set_tasks(Vec::new());
        self.users.clear();
    }

    //
    // Fetches
    //

    /// Register a task fetch. Responses to earlier fetches will be dropped
    pub fn begin_tasks_fetch(&mut self) -> Ticket {
        self.sequencer.issue(Fetched::Tasks)
    }

    /// Apply the response of a task fetch, unless a newer fetch has been issued since.
    ///
    /// Returns whether it has been applied
    pub fn complete_tasks_fetch(&mut self, ticket: Ticket, result: Result<Vec<Task>, ApiError>) -> Result<bool, ApiError> {
        let tasks = result?;
        if self.sequencer.is_current(&ticket) == false {
            log::debug!("Dropping a stale task list ({} tasks)", tasks.len());
            return Ok(false);
        }
        self.tasks.set_tasks(tasks);
        Ok(true)
    }

    pub async fn refresh_tasks(&mut self) -> Result<(), ApiError> {
        let ticket = self.begin_tasks_fetch();
        let result = self.api.list_tasks().await;
        self.complete_tasks_fetch(ticket, result).map(|_| ())
    }

    /// Register a user fetch. Responses to earlier fetches will be dropped
    pub fn begin_users_fetch(&mut self) -> Ticket {
        self.sequencer.issue(Fetched::Users)
    }

    /// Apply the response of a user fetch, unless a newer fetch has been issued since.
    ///
    /// Returns whether it has been applied
    pub fn complete_users_fetch(&mut self, ticket: Ticket, result: Result<Vec<UserRef>, ApiError>) -> Result<bool, ApiError> {
        let users = result?;
        if self.sequencer.is_current(&ticket) == false {
            log::debug!("Dropping a stale user list ({} users)", users.len());
            return Ok(false);
        }
        self.session.resolve_id(&users);
        self.users = users;
        Ok(true)
    }

    pub async fn refresh_users(&mut self) -> Result<(), ApiError> {
        let ticket = self.begin_users_fetch();
        let result = self.api.list_users().await;
        self.complete_users_fetch(ticket, result).map(|_| ())
    }

    //
    // View state
    //

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.tasks.set_filter(filter);
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.tasks.set_sort(sort);
    }

    pub fn switch_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    /// Shift the calendar by a signed number of days. Returns the new first day, or `None` when the calendar cannot go that far
    pub fn advance_week(&mut self, days: i64) -> Option<NaiveDate> {
        self.anchor.advance(days)
    }

    pub fn previous_week(&mut self) -> Option<NaiveDate> {
        self.anchor.previous_week()
    }

    pub fn next_week(&mut self) -> Option<NaiveDate> {
        self.anchor.next_week()
    }

    /// Show the week that contains `date`
    pub fn jump_to(&mut self, date: NaiveDate) {
        self.anchor.jump_to(date);
    }

    /// The tasks of the list view
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks.visible()
    }

    /// The calendar view, as of `today`. It shows the same (filtered) tasks as the list view
    pub fn week(&self, today: NaiveDate) -> Week<'_> {
        calendar::project(self.tasks.visible(), &self.anchor, today)
    }

    /// The calendar view, as of the local current date
    pub fn current_week(&self) -> Week<'_> {
        self.week(today())
    }

    /// Who a new task can be assigned to. The current user always comes first
    pub fn assignees(&self) -> Vec<Assignee> {
        let mut assignees = vec![Assignee { user_id: None, label: "Myself".to_string() }];
        if self.session.can_assign_others() {
            let me = self.session.identity();
            for user in &self.users {
                if me.map(|i| i.is(user)).unwrap_or(false) {
                    continue;
                }
                assignees.push(Assignee {
                    user_id: Some(user.id()),
                    label: format!("{} ({})", user.username(), user.role()),
                });
            }
        }
        assignees
    }

    //
    // Commands
    //

    fn begin(&mut self, kind: CommandKind) -> Result<InFlightGuard, CommandError> {
        let guard = self.in_flight.begin(kind)?;
        self.progress.submitting(kind);
        Ok(guard)
    }

    fn finish<T>(&mut self, guard: InFlightGuard, result: Result<T, CommandError>) -> Result<T, CommandError> {
        let kind = guard.kind();
        drop(guard);
        match &result {
            Ok(_) => self.progress.succeeded(kind),
            Err(err) => self.progress.failed(kind, &err.to_string()),
        }
        result
    }

    /// Re-fetch after a successful command. The command went through anyway, so failures are only logged
    async fn refetch(&mut self, tasks: bool, users: bool) {
        if tasks {
            if let Err(err) = self.refresh_tasks().await {
                log::warn!("Unable to refresh the task list: {}", err);
            }
        }
        if users && self.session.can_manage_users() {
            if let Err(err) = self.refresh_users().await {
                log::warn!("Unable to refresh the user list: {}", err);
            }
        }
    }

    /// Log in, then probe the identity and fetch what it may see
    pub async fn login(&mut self, username: &str, password: &str) -> Result<ProbeOutcome, CommandError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CommandError::Validation("Username and password are required".to_string()));
        }
        let guard = self.begin(CommandKind::Login)?;
        let result = self.api.login(username, password).await.map_err(CommandError::from);
        self.finish(guard, result)?;

        let outcome = self.probe().await;
        if let Err(err) = self.after_probe().await {
            log::warn!("Unable to fetch data after login: {}", err);
        }
        Ok(outcome)
    }

    /// Log out, and forget everything that was fetched
    pub async fn logout(&mut self) -> Result<(), CommandError> {
        let guard = self.begin(CommandKind::Logout)?;
        let result = self.api.logout().await.map_err(CommandError::from);
        self.finish(guard, result)?;
        self.session = Session::anonymous();
        self.clear_data();
        Ok(())
    }

    pub async fn create_task(&mut self, task: NewTask) -> Result<Task, CommandError> {
        if task.title.trim().is_empty() {
            return Err(CommandError::Validation("A task needs a title".to_string()));
        }
        if task.priority.map(|p| p < 0).unwrap_or(false) {
            return Err(CommandError::Validation("Priority cannot be negative".to_string()));
        }
        let guard = self.begin(CommandKind::CreateTask)?;
        let result = self.api.create_task(&task).await.map_err(CommandError::from);
        let created = self.finish(guard, result)?;
        self.refetch(true, false).await;
        Ok(created)
    }

    pub async fn delete_task(&mut self, id: i64) -> Result<(), CommandError> {
        let guard = self.begin(CommandKind::DeleteTask)?;
        let result = self.api.delete_task(id).await.map_err(CommandError::from);
        self.finish(guard, result)?;
        self.refetch(true, false).await;
        Ok(())
    }

    pub async fn set_task_status(&mut self, id: i64, status: TaskStatus) -> Result<Task, CommandError> {
        let guard = self.begin(CommandKind::SetTaskStatus)?;
        let result = self.api.set_task_status(id, status).await.map_err(CommandError::from);
        let updated = self.finish(guard, result)?;
        self.refetch(true, false).await;
        Ok(updated)
    }

    pub async fn approve(&mut self, id: i64) -> Result<Task, CommandError> {
        self.set_task_status(id, TaskStatus::Approved).await
    }

    pub async fn reject(&mut self, id: i64) -> Result<Task, CommandError> {
        self.set_task_status(id, TaskStatus::Rejected).await
    }

    /// Download the CSV export into `folder`, and return the path of the written file
    pub async fn export_tasks_to(&mut self, folder: &Path) -> Result<PathBuf, CommandError> {
        let guard = self.begin(CommandKind::ExportTasks)?;
        let result = match self.api.export_tasks().await {
            Err(err) => Err(CommandError::from(err)),
            Ok(bytes) => save_export(folder, &bytes).await,
        };
        self.finish(guard, result)
    }

    pub async fn create_user(&mut self, user: NewUser) -> Result<UserRef, CommandError> {
        if user.username.trim().is_empty() || user.password.is_empty() {
            return Err(CommandError::Validation("Username and password are required".to_string()));
        }
        if self.session.creatable_roles().contains(&user.role) == false {
            return Err(CommandError::Validation(format!("You cannot create users with the {} role", user.role)));
        }
        let guard = self.begin(CommandKind::CreateUser)?;
        let result = self.api.create_user(&user).await.map_err(CommandError::from);
        let created = self.finish(guard, result)?;
        self.refetch(false, true).await;
        Ok(created)
    }

    pub async fn update_user(&mut self, id: i64, update: UserUpdate) -> Result<UserRef, CommandError> {
        if update.is_empty() {
            return Err(CommandError::Validation("Nothing to update".to_string()));
        }
        let guard = self.begin(CommandKind::UpdateUser)?;
        let result = self.api.update_user(id, &update).await.map_err(CommandError::from);
        let updated = self.finish(guard, result)?;
        self.refetch(false, true).await;
        Ok(updated)
    }

    pub async fn delete_user(&mut self, id: i64) -> Result<(), CommandError> {
        let guard = self.begin(CommandKind::DeleteUser)?;
        let result = self.api.delete_user(id).await.map_err(CommandError::from);
        self.finish(guard, result)?;
        self.refetch(false, true).await;
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn save_export(folder: &Path, content: &[u8]) -> Result<PathBuf, CommandError> {
    let file_name = config::read_option(&config::EXPORT_FILE_NAME, "tasks.csv");
    let path = folder.join(sanitize_filename::sanitize(file_name));
    tokio::fs::write(&path, content).await?;
    log::info!("Exported tasks to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use super::command_progress::{feedback_channel, CommandEvent};
    use crate::mock_api::{MockApi, DEFAULT_PASSWORD};
    use crate::session::Me;
    use crate::mock_behaviour::MockBehaviour;
    use crate::task::Priority;
    use crate::user::Role;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(8, 30, 0).unwrap()
    }

    fn ids(tasks: Vec<&Task>) -> Vec<i64> {
        tasks.iter().map(|t| t.id()).collect()
    }

    /// Never answers the first `stalls` task creations, and forwards everything else to a [`MockApi`]
    struct StallingApi {
        inner: MockApi,
        stalls: AtomicU32,
    }

    impl StallingApi {
        fn new(stalls: u32) -> Self {
            Self { inner: MockApi::new(), stalls: AtomicU32::new(stalls) }
        }
    }

    #[async_trait]
    impl TaskApi for StallingApi {
        async fn me(&self) -> Result<Me, ApiError> { self.inner.me().await }
        async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> { self.inner.login(username, password).await }
        async fn logout(&self) -> Result<(), ApiError> { self.inner.logout().await }
        async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> { self.inner.list_tasks().await }
        async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
            let stall = self.stalls.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
            if stall {
                std::future::pending::<()>().await;
            }
            self.inner.create_task(task).await
        }
        async fn delete_task(&self, id: i64) -> Result<(), ApiError> { self.inner.delete_task(id).await }
        async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError> { self.inner.set_task_status(id, status).await }
        async fn export_tasks(&self) -> Result<Vec<u8>, ApiError> { self.inner.export_tasks().await }
        async fn list_users(&self) -> Result<Vec<UserRef>, ApiError> { self.inner.list_users().await }
        async fn create_user(&self, user: &NewUser) -> Result<UserRef, ApiError> { self.inner.create_user(user).await }
        async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserRef, ApiError> { self.inner.update_user(id, update).await }
        async fn delete_user(&self, id: i64) -> Result<(), ApiError> { self.inner.delete_user(id).await }
    }

    async fn logged_in(username: &str) -> Dispatcher<MockApi> {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = MockApi::new();
        api.log_in_as(username);
        let mut dispatcher = Dispatcher::new(api);
        assert_eq!(dispatcher.start().await.unwrap(), ProbeOutcome::LoggedIn);
        dispatcher
    }

    #[tokio::test]
    async fn plain_users_do_not_fetch_users() {
        let dispatcher = logged_in("user").await;
        assert_eq!(dispatcher.api().calls(), vec!["me", "list_tasks"]);
        assert!(dispatcher.users().is_empty());
        assert_eq!(dispatcher.assignees().len(), 1);
    }

    #[tokio::test]
    async fn managers_fetch_users_after_the_probe() {
        let api = MockApi::new();
        let dave = api.add_user("dave", Role::User, Some(2));
        api.log_in_as("manager");
        let mut dispatcher = Dispatcher::new(api);

        assert_eq!(dispatcher.probe().await, ProbeOutcome::LoggedIn);
        assert_eq!(dispatcher.api().calls(), vec!["me"]);
        dispatcher.after_probe().await.unwrap();
        assert_eq!(dispatcher.api().calls(), vec!["me", "list_tasks", "list_users"]);

        let assignees = dispatcher.assignees();
        assert_eq!(assignees[0], Assignee { user_id: None, label: "Myself".to_string() });
        assert_eq!(assignees[1], Assignee { user_id: Some(dave.id()), label: "dave (USER)".to_string() });
    }

    #[tokio::test]
    async fn failed_probes_log_out() {
        let api = MockApi::new();
        api.log_in_as("admin");
        api.set_behaviour(MockBehaviour::fail_now(1));
        let mut dispatcher = Dispatcher::new(api);
        assert_eq!(dispatcher.start().await.unwrap(), ProbeOutcome::LoggedOut);
        assert!(!dispatcher.session().is_authenticated());
        assert_eq!(dispatcher.api().calls(), vec!["me"]);
    }

    #[tokio::test]
    async fn stale_task_lists_are_dropped() {
        let mut dispatcher = logged_in("admin").await;
        let api_task = dispatcher.api().add_task("old", TaskStatus::Pending, Priority::new(1), at(2), 1, None);

        let first = dispatcher.begin_tasks_fetch();
        let second = dispatcher.begin_tasks_fetch();
        assert_eq!(dispatcher.complete_tasks_fetch(second, Ok(vec![api_task.clone()])), Ok(true));
        assert_eq!(dispatcher.complete_tasks_fetch(first, Ok(Vec::new())), Ok(false));
        assert_eq!(ids(dispatcher.visible_tasks()), vec![api_task.id()]);
    }

    #[tokio::test]
    async fn failed_deletions_leave_the_list_alone() {
        let mut dispatcher = logged_in("admin").await;
        let task = dispatcher.api().add_task("keep me", TaskStatus::Pending, Priority::new(1), at(2), 1, None);
        dispatcher.refresh_tasks().await.unwrap();

        dispatcher.api().set_behaviour(MockBehaviour {
            delete_task_behaviour: (0, 1),
            ..MockBehaviour::default()
        }.rejecting_with(403, r#"{"message":"forbidden"}"#));
        dispatcher.api().clear_calls();

        let err = dispatcher.delete_task(task.id()).await.unwrap_err();
        assert_eq!(err.to_string(), "forbidden");
        assert_eq!(err.api_error().and_then(|e| e.status()), Some(403));
        assert_eq!(ids(dispatcher.visible_tasks()), vec![task.id()]);
        assert_eq!(dispatcher.api().calls(), vec!["delete_task"]);
        assert_eq!(dispatcher.command_state(CommandKind::DeleteTask), CommandState::Idle);
    }

    #[tokio::test]
    async fn commands_refetch_on_success() {
        let mut dispatcher = logged_in("manager").await;
        let created = dispatcher.create_task(NewTask {
            title: "Review budget".to_string(),
            priority: Some(2),
            ..NewTask::default()
        }).await.unwrap();
        assert_eq!(ids(dispatcher.visible_tasks()), vec![created.id()]);

        dispatcher.approve(created.id()).await.unwrap();
        assert_eq!(dispatcher.tasks().get(created.id()).map(|t| t.status()), Some(TaskStatus::Approved));

        dispatcher.delete_task(created.id()).await.unwrap();
        assert!(dispatcher.visible_tasks().is_empty());
    }

    #[tokio::test]
    async fn abandoned_commands_can_be_issued_again() {
        let api = StallingApi::new(1);
        api.inner.log_in_as("user");
        let (sender, receiver) = feedback_channel();
        let mut dispatcher = Dispatcher::new_with_feedback_channel(api, sender);
        dispatcher.start().await.unwrap();
        let form = NewTask { title: "twice".to_string(), ..NewTask::default() };

        tokio::select! {
            biased;
            _ = dispatcher.create_task(form.clone()) => panic!("the first creation should still be waiting for the server"),
            _ = async {} => {},
        }
        assert_eq!(*receiver.borrow(), CommandEvent::Submitting { command: CommandKind::CreateTask });
        assert_eq!(dispatcher.command_state(CommandKind::CreateTask), CommandState::Idle);

        let created = dispatcher.create_task(form).await.unwrap();
        assert_eq!(*receiver.borrow(), CommandEvent::Succeeded { command: CommandKind::CreateTask });
        assert_eq!(ids(dispatcher.visible_tasks()), vec![created.id()]);
        assert_eq!(dispatcher.api().inner.tasks().len(), 1);
    }

    #[tokio::test]
    async fn invalid_forms_are_not_sent() {
        let mut dispatcher = logged_in("manager").await;
        dispatcher.api().clear_calls();

        let blank = dispatcher.create_task(NewTask { title: "  ".to_string(), ..NewTask::default() }).await;
        assert!(matches!(blank, Err(CommandError::Validation(_))));

        let admin = dispatcher.create_user(NewUser {
            username: "eve".to_string(),
            password: "pw".to_string(),
            role: Role::Admin,
            email: String::new(),
        }).await;
        assert!(matches!(admin, Err(CommandError::Validation(_))));
        assert!(matches!(dispatcher.update_user(3, UserUpdate::default()).await, Err(CommandError::Validation(_))));
        assert!(dispatcher.api().calls().is_empty());
    }

    #[tokio::test]
    async fn login_and_logout() {
        let mut dispatcher = Dispatcher::new(MockApi::new());
        let wrong = dispatcher.login("admin", "nope").await.unwrap_err();
        assert_eq!(wrong.to_string(), "Invalid username or password");

        assert_eq!(dispatcher.login("admin", DEFAULT_PASSWORD).await.unwrap(), ProbeOutcome::LoggedIn);
        assert_eq!(dispatcher.session().identity().and_then(|i| i.id()), Some(1));
        assert_eq!(dispatcher.users().len(), 3);

        dispatcher.logout().await.unwrap();
        assert!(!dispatcher.session().is_authenticated());
        assert!(dispatcher.users().is_empty());
        assert!(dispatcher.tasks().is_empty());
    }

    #[tokio::test]
    async fn calendar_follows_the_filter() {
        let mut dispatcher = logged_in("admin").await;
        let api = dispatcher.api();
        let pending = api.add_task("pending", TaskStatus::Pending, Priority::new(1), at(9), 1, None);
        let approved = api.add_task("approved", TaskStatus::Approved, Priority::new(1), at(10), 1, None);
        api.add_task("other week", TaskStatus::Pending, Priority::new(1), at(20), 1, None);
        dispatcher.refresh_tasks().await.unwrap();

        dispatcher.jump_to(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        dispatcher.switch_view(ViewMode::Calendar);
        assert_eq!(dispatcher.view(), ViewMode::Calendar);

        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        {
            let week = dispatcher.week(today);
            assert_eq!(week.start(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
            assert_eq!(week.task_count(), 2);
            assert_eq!(ids(week.days()[2].tasks().to_vec()), vec![pending.id()]);
            assert!(week.days()[3].is_today());
        }

        dispatcher.set_filter(StatusFilter::Only(TaskStatus::Approved));
        {
            let week = dispatcher.week(today);
            assert_eq!(week.task_count(), 1);
            assert_eq!(ids(week.days()[3].tasks().to_vec()), vec![approved.id()]);
        }

        dispatcher.next_week();
        dispatcher.set_filter(StatusFilter::All);
        assert_eq!(dispatcher.week(today).task_count(), 1);

        assert_eq!(dispatcher.advance_week(i64::MAX / 2), None);
        assert_eq!(dispatcher.anchor().start(), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
    }
}
