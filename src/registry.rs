// registry.rs - Command Registry
// Holds every command the bot knows and indexes them by each verb they answer to.
// Built once at startup; nothing mutates it afterwards.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::context::{CommandContext, CommandResult};
use crate::error::RegistryError;

/// Behaviour behind a command. Implementations must turn every failure into a
/// CommandError rather than panicking.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, args: &[String], ctx: &dyn CommandContext) -> CommandResult;
}

pub struct Command {
    pub name: &'static str,
    pub description: &'static str,
    /// [] for optional arguments, <> for required ones
    pub usage: &'static str,
    pub verbs: &'static [&'static str],
    pub needs_store: bool,
    handler: Box<dyn CommandHandler>,
}

impl Command {
    pub fn new(name: &'static str, verbs: &'static [&'static str], handler: impl CommandHandler + 'static) -> Self {
        Command {
            name,
            description: "",
            usage: "",
            verbs,
            needs_store: false,
            handler: Box::new(handler),
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn usage(mut self, usage: &'static str) -> Self {
        self.usage = usage;
        self
    }

    pub fn needs_store(mut self) -> Self {
        self.needs_store = true;
        self
    }

    pub fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("verbs", &self.verbs)
            .field("needs_store", &self.needs_store)
            .finish()
    }
}

/// Verb -> command mapping. Registration order is kept for display only.
#[derive(Debug)]
pub struct Registry {
    commands: Vec<Command>,
    verbs: HashMap<&'static str, usize>,
}

impl Registry {
    /// Build the registry. A verb declared twice is a startup error, as is a
    /// command with no verbs or a verb that is empty or contains a space.
    pub fn register(commands: Vec<Command>) -> Result<Self, RegistryError> {
        let mut verbs: HashMap<&'static str, usize> = HashMap::new();

        for (index, command) in commands.iter().enumerate() {
            if command.verbs.is_empty() {
                return Err(RegistryError::NoVerbs(command.name.to_string()));
            }
            for verb in command.verbs {
                if verb.is_empty() || verb.contains(' ') {
                    return Err(RegistryError::InvalidVerb {
                        command: command.name.to_string(),
                        verb: verb.to_string(),
                    });
                }
                if let Some(&existing) = verbs.get(verb) {
                    return Err(RegistryError::DuplicateVerb {
                        verb: verb.to_string(),
                        first: commands[existing].name.to_string(),
                        second: command.name.to_string(),
                    });
                }
                verbs.insert(*verb, index);
            }
        }

        Ok(Registry { commands, verbs })
    }

    /// Case-sensitive exact lookup. None means "unknown command", not an error.
    pub fn resolve(&self, verb: &str) -> Option<&Command> {
        self.verbs.get(verb).map(|&index| &self.commands[index])
    }

    /// Commands in registration order
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}
