//! Display list output model

mod command;

pub use command::{Command, StateCommand};

use serde::Serialize;

/// Named, append-only command list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayList {
    name: String,
    commands: Vec<Command>,
}

impl DisplayList {
    /// Create an empty list
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Create a list from already generated commands
    pub fn with_commands(name: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            commands,
        }
    }

    /// Symbol name of the list
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a command
    pub fn push(&mut self, command: impl Into<Command>) {
        self.commands.push(command.into());
    }

    /// All commands in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Total triangles drawn
    pub fn triangle_count(&self) -> usize {
        self.commands.iter().map(Command::triangle_count).sum()
    }

    /// Commands matching a predicate
    pub fn count(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|command| predicate(command)).count()
    }
}

impl Extend<Command> for DisplayList {
    fn extend<I: IntoIterator<Item = Command>>(&mut self, iter: I) {
        self.commands.extend(iter);
    }
}
