//! This crate provides a client for a task-tracking server.
//!
//! It provides a client in the [`client`] module, that talks to the server REST API (see the [`TaskApi`](traits::TaskApi) trait).
//!
//! On top of it, a [`Dispatcher`] holds everything a UI needs to show: the current [`Session`](session::Session), the fetched tasks and users,
//! the list view (see [`TaskCollection`](collection::TaskCollection)) and the weekly [`calendar`] view. \
//! User actions go through the `Dispatcher` too, which sends them to the server and refreshes its data afterwards.

pub mod traits;
pub mod config;
pub mod error;
pub use error::{ApiError, CommandError};

mod resource;
mod task;
pub use task::{NewTask, Priority, Task, TaskStatus};
mod user;
pub use user::{NewUser, Role, UserRef, UserUpdate};
pub mod session;

pub mod collection;
pub mod calendar;
pub mod dispatcher;
pub use dispatcher::Dispatcher;

pub mod client;
#[cfg(any(test, feature = "mock_api"))]
pub mod mock_api;
#[cfg(any(test, feature = "mock_api"))]
pub mod mock_behaviour;

pub mod utils;
