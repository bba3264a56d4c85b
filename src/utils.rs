//! Some utility functions, mostly debug pretty-printers

use std::io::{stdin, stdout, BufRead, Write};

use crate::calendar::Week;
use crate::session::Session;
use crate::task::{Task, TaskStatus};
use crate::user::UserRef;

/// One line describing a task, as the list view shows it
pub fn task_line(task: &Task, session: &Session) -> String {
    let status = match task.status() {
        TaskStatus::Pending => "?",
        TaskStatus::Approved => "✓",
        TaskStatus::Rejected => "x",
    };
    let creator = task.create_user().map(|u| u.username()).unwrap_or("Unknown");
    let assignee = task.assigned_user().map(|u| u.username()).unwrap_or("Unassigned");

    let mut actions = Vec::new();
    if session.can_review(task) {
        actions.push("approve/reject");
    }
    if session.can_delete(task) {
        actions.push("delete");
    }

    let mut line = format!("{} #{} {}\t(priority {}, created {}, by {}, for {})",
        status, task.id(), task.title(), task.priority(),
        task.created_date().format("%Y-%m-%d"), creator, assignee);
    if actions.is_empty() == false {
        line.push_str(&format!(" [{}]", actions.join(", ")));
    }
    line
}

/// A debug utility that pretty-prints a task list
pub fn print_task_list(tasks: &[&Task], session: &Session) {
    if tasks.is_empty() {
        println!("    (no task)");
    }
    for task in tasks {
        println!("    {}", task_line(task, session));
        println!("        {}", task.description().unwrap_or("No description"));
    }
}

/// A debug utility that pretty-prints a calendar week
pub fn print_week(week: &Week) {
    println!("Week of {}", week.range_label());
    for day in week.days() {
        let marker = if day.is_today() { "*" } else { " " };
        println!("  {}{}", marker, day.label());
        for task in day.tasks() {
            println!("        {} ({})", task.title(), task.status());
        }
    }
}

/// A debug utility that pretty-prints a user list
pub fn print_user_list(users: &[UserRef]) {
    println!("    {:<16}{:<10}{:<16}{}", "Username", "Role", "Manager", "Email");
    for user in users {
        println!("    {:<16}{:<10}{:<16}{}",
            user.username(),
            user.role().to_string(),
            user.manager().map(|m| m.username()).unwrap_or("-"),
            user.email().unwrap_or("-"));
    }
}

/// Wait for the user to type a line, and return it (without its trailing newline)
pub fn prompt(text: &str) -> std::io::Result<String> {
    let mut stdout = stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    let mut line = String::new();
    stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(|c| c == '\n' || c == '\r').to_string())
}
