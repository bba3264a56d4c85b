//! This module provides ways to tweak a mocked server, so that it can return errors on some tests
#![cfg(any(test, feature = "mock_api"))]

use crate::error::ApiError;

/// This stores some behaviour tweaks, that describe how a mocked server will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,
    /// When set, failures are reported as this HTTP status and response body. Otherwise they are network errors.
    pub rejection: Option<(u16, String)>,

    // Session
    pub me_behaviour: (u32, u32),
    pub login_behaviour: (u32, u32),

    // Tasks
    pub list_tasks_behaviour: (u32, u32),
    pub create_task_behaviour: (u32, u32),
    pub delete_task_behaviour: (u32, u32),
    pub set_task_status_behaviour: (u32, u32),
    pub export_tasks_behaviour: (u32, u32),

    // Users
    pub list_users_behaviour: (u32, u32),
    pub write_user_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            rejection: None,
            me_behaviour: (0, n_fails),
            login_behaviour: (0, n_fails),
            list_tasks_behaviour: (0, n_fails),
            create_task_behaviour: (0, n_fails),
            delete_task_behaviour: (0, n_fails),
            set_task_status_behaviour: (0, n_fails),
            export_tasks_behaviour: (0, n_fails),
            list_users_behaviour: (0, n_fails),
            write_user_behaviour: (0, n_fails),
        }
    }

    /// Report failures with this HTTP status and body, instead of network errors
    pub fn rejecting_with(mut self, status: u16, body: &str) -> Self {
        self.rejection = Some((status, body.to_string()));
        self
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_me(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.me_behaviour, "me", &self.rejection)
    }
    pub fn can_login(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.login_behaviour, "login", &self.rejection)
    }
    pub fn can_list_tasks(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.list_tasks_behaviour, "list_tasks", &self.rejection)
    }
    pub fn can_create_task(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.create_task_behaviour, "create_task", &self.rejection)
    }
    pub fn can_delete_task(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.delete_task_behaviour, "delete_task", &self.rejection)
    }
    pub fn can_set_task_status(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.set_task_status_behaviour, "set_task_status", &self.rejection)
    }
    pub fn can_export_tasks(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.export_tasks_behaviour, "export_tasks", &self.rejection)
    }
    pub fn can_list_users(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.list_users_behaviour, "list_users", &self.rejection)
    }
    pub fn can_write_user(&mut self) -> Result<(), ApiError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.write_user_behaviour, "write_user", &self.rejection)
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str, rejection: &Option<(u16, String)>) -> Result<(), ApiError> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        match rejection {
            Some((status, body)) => Err(ApiError::rejected(*status, body)),
            None => Err(ApiError::Network(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value))),
        }
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_list_tasks().is_ok());
        assert!(ok.can_list_tasks().is_ok());
        assert!(ok.can_delete_task().is_ok());

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_list_tasks().is_err());
        assert!(now.can_create_task().is_err());
        assert!(now.can_create_task().is_err());
        assert!(now.can_list_tasks().is_err());
        assert!(now.can_list_tasks().is_ok());
        assert!(now.can_list_tasks().is_ok());
        assert!(now.can_create_task().is_ok());

        let mut custom = MockBehaviour{
            list_tasks_behaviour: (0,1),
            delete_task_behaviour: (1,2),
            ..MockBehaviour::default()
        }.rejecting_with(403, r#"{"message":"forbidden"}"#);
        assert_eq!(custom.can_list_tasks(), Err(ApiError::Rejected{ status: 403, message: "forbidden".to_string() }));
        assert!(custom.can_list_tasks().is_ok());
        assert!(custom.can_delete_task().is_ok());
        assert!(custom.can_delete_task().is_err());
        assert!(custom.can_delete_task().is_err());
        assert!(custom.can_delete_task().is_ok());

        let mut suspended = MockBehaviour::fail_now(1);
        suspended.suspend();
        assert!(suspended.can_me().is_ok());
        suspended.resume();
        assert!(suspended.can_me().is_err());
    }
}
