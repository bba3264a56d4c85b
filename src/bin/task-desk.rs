//! A small command-line front-end: logs in, then shows the task list, the current week, and the users you manage.
//!
//! Set `TASK_DESK_URL` (and optionally `TASK_DESK_USERNAME` / `TASK_DESK_PASSWORD`), and `RUST_LOG` for more details.

use std::env;
use std::error::Error;

use task_desk::client::Client;
use task_desk::collection::SortKey;
use task_desk::dispatcher::ProbeOutcome;
use task_desk::Dispatcher;
use task_desk::utils::{print_task_list, print_user_list, print_week, prompt};

const DEFAULT_URL: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let url = env::var("TASK_DESK_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let client = Client::new(&url)?;
    let mut dispatcher = Dispatcher::new(client);

    if dispatcher.start().await? == ProbeOutcome::LoggedOut {
        let username = match env::var("TASK_DESK_USERNAME") {
            Ok(name) => name,
            Err(_) => prompt("Username: ")?,
        };
        let password = match env::var("TASK_DESK_PASSWORD") {
            Ok(password) => password,
            Err(_) => prompt("Password: ")?,
        };
        if dispatcher.login(&username, &password).await? == ProbeOutcome::LoggedOut {
            log::error!("The server did not accept the session, giving up");
            return Ok(());
        }
    }

    let session = dispatcher.session();
    if let Some(identity) = session.identity() {
        let role = session.primary_role().map(|r| r.to_string()).unwrap_or_else(|| "?".to_string());
        println!("Logged in as: {} ({})", identity.username(), role);
    }

    println!("---- Tasks, newest first -----");
    print_task_list(&dispatcher.visible_tasks(), dispatcher.session());

    dispatcher.set_sort(SortKey::Priority);
    println!("---- Tasks, most urgent first -----");
    print_task_list(&dispatcher.visible_tasks(), dispatcher.session());

    println!("---- This week -----");
    print_week(&dispatcher.current_week());

    if dispatcher.session().can_manage_users() {
        println!("---- Users -----");
        print_user_list(dispatcher.users());
    }

    Ok(())
}
