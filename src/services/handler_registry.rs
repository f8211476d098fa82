//! Static command and callback routing table.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::ports::BotCommand;
use crate::services::command_handlers::{
    CommandHandler, GithubHandler, HandlerDeps, HelpHandler, LinkHandler, PingHandler,
    StatusHandler,
};
use crate::services::validation::{ArgumentCount, Validation};

pub type HandlerConstructor = fn(&HandlerDeps) -> Box<dyn CommandHandler>;

/// One row of the routing table.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    pub command: &'static str,
    /// Present for handlers advertised in the platform command list
    pub short_description: Option<&'static str>,
    pub callback_type: Option<&'static str>,
    pub validation: Validation,
    pub constructor: HandlerConstructor,
}

impl HandlerDescriptor {
    pub fn is_public(&self) -> bool {
        self.short_description.is_some_and(|d| !d.is_empty())
    }

    pub fn build(&self, deps: &HandlerDeps) -> Box<dyn CommandHandler> {
        (self.constructor)(deps)
    }
}

/// Immutable lookup over a table of handler descriptors.
#[derive(Debug)]
pub struct HandlerRegistry {
    descriptors: Vec<HandlerDescriptor>,
    by_command: HashMap<&'static str, usize>,
    by_callback: HashMap<&'static str, usize>,
}

impl HandlerRegistry {
    /// Index `descriptors`. On duplicate keys the first row wins.
    pub fn new(descriptors: Vec<HandlerDescriptor>) -> Self {
        let mut by_command = HashMap::new();
        let mut by_callback = HashMap::new();

        for (index, descriptor) in descriptors.iter().enumerate() {
            if by_command.contains_key(descriptor.command) {
                warn!(command = descriptor.command, "duplicate command registration ignored");
            } else {
                by_command.insert(descriptor.command, index);
            }

            if let Some(callback_type) = descriptor.callback_type {
                by_callback.entry(callback_type).or_insert(index);
            }
        }

        Self {
            descriptors,
            by_command,
            by_callback,
        }
    }

    /// The built-in command set.
    pub fn builtin() -> Self {
        Self::new(vec![
            HandlerDescriptor {
                command: "link",
                short_description: Some("Link your happiness-mj.xyz account."),
                callback_type: None,
                validation: Validation::custom(ArgumentCount::none()),
                constructor: |deps| Box::new(LinkHandler::new(deps)),
            },
            HandlerDescriptor {
                command: "ping",
                short_description: Some("Sends \"pong\" in response."),
                callback_type: None,
                validation: Validation::None,
                constructor: |deps| Box::new(PingHandler::new(deps)),
            },
            HandlerDescriptor {
                command: "github",
                short_description: Some("Sends github link."),
                callback_type: None,
                validation: Validation::None,
                constructor: |deps| Box::new(GithubHandler::new(deps)),
            },
            HandlerDescriptor {
                command: "help",
                short_description: Some("Display help message."),
                callback_type: None,
                validation: Validation::custom(ArgumentCount::at_most(1)),
                constructor: |deps| Box::new(HelpHandler::new(deps)),
            },
            HandlerDescriptor {
                command: "status",
                short_description: None,
                callback_type: None,
                validation: Validation::None,
                constructor: |deps| Box::new(StatusHandler::new(deps)),
            },
        ])
    }

    pub fn lookup(&self, command: &str) -> Option<&HandlerDescriptor> {
        self.by_command.get(command).map(|&i| &self.descriptors[i])
    }

    pub fn lookup_callback(&self, callback_type: &str) -> Option<&HandlerDescriptor> {
        self.by_callback.get(callback_type).map(|&i| &self.descriptors[i])
    }

    /// Handlers with a description, in registration order.
    pub fn public_handlers(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.descriptors.iter().filter(|d| d.is_public())
    }

    /// Command list advertised to the platform.
    pub fn bot_commands(&self) -> Vec<BotCommand> {
        self.public_handlers()
            .map(|d| BotCommand {
                command: d.command.to_string(),
                description: d.short_description.unwrap_or_default().to_string(),
            })
            .collect()
    }
}
