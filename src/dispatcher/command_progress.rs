//! Utilities to track the progression of a user command

use std::fmt::{Display, Error, Formatter};

use super::CommandKind;

/// An event that happens while a command runs
#[derive(Clone, Debug, PartialEq)]
pub enum CommandEvent {
    /// No command has run yet
    Idle,
    /// The request of a command has been sent
    Submitting{ command: CommandKind },
    /// The server accepted the command
    Succeeded{ command: CommandKind },
    /// The command was not carried out
    Failed{ command: CommandKind, message: String },
}

impl Display for CommandEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            CommandEvent::Idle => write!(f, "Idle"),
            CommandEvent::Submitting{command} => write!(f, "[{}] submitting...", command),
            CommandEvent::Succeeded{command} => write!(f, "[{}] done", command),
            CommandEvent::Failed{command, message} => write!(f, "[{}] failed: {}", command, message),
        }
    }
}

impl Default for CommandEvent {
    fn default() -> Self {
        Self::Idle
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<CommandEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<CommandEvent>;

/// Create a feeback channel, that can be used to follow the commands a [`Dispatcher`](super::Dispatcher) runs
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(CommandEvent::default())
}



/// Logs the outcome of commands, and forwards it to the listener (if any)
#[derive(Default)]
pub struct CommandProgress {
    n_failures: u32,
    feedback_channel: Option<FeedbackSender>,
}

impl CommandProgress {
    pub fn new() -> Self {
        Self { n_failures: 0, feedback_channel: None }
    }
    pub fn new_with_feedback_channel(channel: FeedbackSender) -> Self {
        Self { n_failures: 0, feedback_channel: Some(channel) }
    }

    /// How many commands have failed so far
    pub fn n_failures(&self) -> u32 {
        self.n_failures
    }

    pub fn submitting(&mut self, command: CommandKind) {
        log::debug!("Submitting a {} request", command);
        self.feedback(CommandEvent::Submitting{ command });
    }

    pub fn succeeded(&mut self, command: CommandKind) {
        log::info!("{} succeeded", command);
        self.feedback(CommandEvent::Succeeded{ command });
    }

    pub fn failed(&mut self, command: CommandKind, message: &str) {
        log::warn!("{} failed: {}", command, message);
        self.n_failures += 1;
        self.feedback(CommandEvent::Failed{ command, message: message.to_string() });
    }

    /// Send an event as a feedback to the listener (if any).
    fn feedback(&mut self, event: CommandEvent) {
        if let Some(sender) = self.feedback_channel.as_ref() {
            // The listener may have gone away, this is fine
            let _ = sender.send(event);
        }
    }
}
