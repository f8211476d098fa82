//! Bot command model.

use serde::{Deserialize, Serialize};

/// Position of the command entity inside the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub offset: usize,
    pub length: usize,
}

/// A `/command@bot arg1 arg2` invocation parsed from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Lower-cased command name without the leading `/`
    pub name: String,
    /// Whitespace-separated arguments following the command
    pub raw_args: Vec<String>,
    /// Bot username after `@`, if the command was addressed explicitly
    pub target_bot: Option<String>,
    pub span: SourceSpan,
}

impl Command {
    /// Only a command at the very start of the message is acted upon.
    pub fn is_leading(&self) -> bool {
        self.span.offset == 0
    }

    /// Whether a bot named `username` should handle this command.
    ///
    /// Unaddressed commands belong to every bot in the chat.
    pub fn is_addressed_to(&self, username: &str) -> bool {
        self.target_bot
            .as_deref()
            .is_none_or(|target| target.eq_ignore_ascii_case(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(target: Option<&str>, offset: usize) -> Command {
        Command {
            name: "ping".to_string(),
            raw_args: vec![],
            target_bot: target.map(str::to_string),
            span: SourceSpan { offset, length: 5 },
        }
    }

    #[test]
    fn test_addressing() {
        assert!(command(None, 0).is_addressed_to("gcservantbot"));
        assert!(command(Some("gcservantbot"), 0).is_addressed_to("gcservantbot"));
        assert!(command(Some("GCServantBot"), 0).is_addressed_to("gcservantbot"));
        assert!(!command(Some("otherbot"), 0).is_addressed_to("gcservantbot"));
    }

    #[test]
    fn test_leading() {
        assert!(command(None, 0).is_leading());
        assert!(!command(None, 4).is_leading());
    }
}
