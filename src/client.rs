//! This module provides a client to connect to a task server

use std::error::Error;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config;
use crate::error::ApiError;
use crate::resource::Resource;
use crate::session::Me;
use crate::task::{NewTask, Task, TaskStatus};
use crate::traits::TaskApi;
use crate::user::{NewUser, UserRef, UserUpdate};

static ME_PATH: &str = "/api/auth/me";
static LOGIN_PATH: &str = "/login";
static LOGOUT_PATH: &str = "/logout";
static TASKS_PATH: &str = "/api/tasks";
static EXPORT_PATH: &str = "/api/tasks/export";
static USERS_PATH: &str = "/api/users";

#[derive(Serialize)]
struct StatusBody {
    status: TaskStatus,
}

/// A [`TaskApi`] that talks to an actual server.
///
/// The server keeps the session in a cookie, that this client stores between requests.
/// Redirects are not followed, so that the outcome of a form login can be told from its redirect target.
pub struct Client {
    resource: Resource,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>>(url: S) -> Result<Self, Box<dyn Error>> {
        let url = Url::parse(url.as_ref())?;
        let user_agent = config::read_option(&config::USER_AGENT, "task-desk");

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            resource: Resource::new(url),
            http,
        })
    }

    pub fn url(&self) -> &Url {
        self.resource.url()
    }

    fn url_for(&self, path: &str) -> Url {
        self.resource.combine(path).url().clone()
    }

    fn task_url(&self, id: i64) -> Url {
        self.url_for(&format!("{}/{}", TASKS_PATH, id))
    }

    fn user_url(&self, id: i64) -> Url {
        self.url_for(&format!("{}/{}", USERS_PATH, id))
    }
}

/// Turn a non-success response into an error
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    log::debug!("Request to {} rejected with {}: {}", url, status, body);
    Err(ApiError::rejected(status.as_u16(), &body))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|err| ApiError::Decode(format!("{} (body was {:?})", err, text)))
}

/// Redirects are how the form login reports its outcome
fn is_accepted_redirect(response: &Response) -> bool {
    if response.status().is_redirection() == false {
        return false;
    }
    match response.headers().get(LOCATION).and_then(|l| l.to_str().ok()) {
        None => true,
        Some(location) => location.contains("error") == false,
    }
}

#[async_trait]
impl TaskApi for Client {
    async fn me(&self) -> Result<Me, ApiError> {
        let response = self.http.get(self.url_for(ME_PATH)).send().await?;
        parse_json(response).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self.http
            .post(self.url_for(LOGIN_PATH))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || is_accepted_redirect(&response) {
            log::info!("Logged in as {}", username);
            return Ok(());
        }
        if status.is_redirection() {
            return Err(ApiError::Rejected {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message: "Invalid username or password".to_string(),
            });
        }
        check(response).await.map(|_| ())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self.http.post(self.url_for(LOGOUT_PATH)).send().await?;
        if response.status().is_redirection() {
            return Ok(());
        }
        check(response).await.map(|_| ())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.http.get(self.url_for(TASKS_PATH)).send().await?;
        let tasks: Vec<Task> = parse_json(response).await?;
        log::debug!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let response = self.http
            .post(self.url_for(TASKS_PATH))
            .json(task)
            .send()
            .await?;
        parse_json(response).await
    }

    async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        let response = self.http.delete(self.task_url(id)).send().await?;
        check(response).await.map(|_| ())
    }

    async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError> {
        let url = self.url_for(&format!("{}/{}/approve", TASKS_PATH, id));
        let response = self.http
            .put(url)
            .json(&StatusBody { status })
            .send()
            .await?;
        parse_json(response).await
    }

    async fn export_tasks(&self) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(self.url_for(EXPORT_PATH)).send().await?;
        let response = check(response).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn list_users(&self) -> Result<Vec<UserRef>, ApiError> {
        let response = self.http.get(self.url_for(USERS_PATH)).send().await?;
        let users: Vec<UserRef> = parse_json(response).await?;
        log::debug!("Fetched {} users", users.len());
        Ok(users)
    }

    async fn create_user(&self, user: &NewUser) -> Result<UserRef, ApiError> {
        let response = self.http
            .post(self.url_for(USERS_PATH))
            .json(user)
            .send()
            .await?;
        parse_json(response).await
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserRef, ApiError> {
        let response = self.http
            .put(self.user_url(id))
            .json(update)
            .send()
            .await?;
        parse_json(response).await
    }

    async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        let response = self.http.delete(self.user_url(id)).send().await?;
        check(response).await.map(|_| ())
    }
}
