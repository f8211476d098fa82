use regex::Regex;
use serde_json::Value;
use std::fmt;

/// Replacement for redacted values.
pub const MASK: &str = "***";

/// Update fields that identify users or carry their messages.
///
/// A leading `*.` matches the rest of the path at any depth.
pub const REDACTED_FIELDS: [&str; 7] = [
    "*.from.id",
    "*.from.first_name",
    "*.from.last_name",
    "*.from.username",
    "*.forward_from_chat.username",
    "*.text",
    "*.chat.title",
];

/// Removes the bot token from strings before they are logged.
///
/// Tokens appear in Bot API URLs as `/bot<token>/`; the configured token is
/// also masked wherever it shows up on its own.
#[derive(Clone)]
pub struct SecretScrubber {
    url_token_pattern: Regex,
    known_token: Option<Regex>,
}

impl SecretScrubber {
    pub fn new(token: Option<&str>) -> Result<Self, regex::Error> {
        let known_token = token
            .filter(|t| !t.is_empty())
            .map(|t| Regex::new(&regex::escape(t)))
            .transpose()?;

        Ok(Self {
            url_token_pattern: Regex::new(r"/bot[0-9]+:[A-Za-z0-9_-]+")?,
            known_token,
        })
    }

    /// Scrub a message of the bot token.
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = self
            .url_token_pattern
            .replace_all(message, format!("/bot{MASK}").as_str())
            .into_owned();

        match &self.known_token {
            Some(pattern) => pattern.replace_all(&scrubbed, MASK).into_owned(),
            None => scrubbed,
        }
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish_non_exhaustive()
    }
}

fn matches_field(path: &str, template: &str) -> bool {
    match template.strip_prefix("*.") {
        Some(ending) => {
            path == ending
                || path
                    .strip_suffix(ending)
                    .is_some_and(|head| head.ends_with('.'))
        }
        None => path == template,
    }
}

fn redact_in_place(value: &mut Value, parent: &str) {
    let Value::Object(map) = value else {
        return;
    };

    for (key, child) in map.iter_mut() {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}.{key}")
        };

        if REDACTED_FIELDS.iter().any(|t| matches_field(&path, t)) {
            *child = Value::String(MASK.to_string());
        } else {
            redact_in_place(child, &path);
        }
    }
}

/// Copy of a raw update with personal fields masked.
pub fn redact_update(update: &Value) -> Value {
    let mut copy = update.clone();
    redact_in_place(&mut copy, "");
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw";

    #[test]
    fn test_scrub_token_in_url() {
        let scrubber = SecretScrubber::new(None).unwrap();
        let message = format!("error sending request for url (https://api.telegram.org/bot{TOKEN}/getUpdates)");
        let scrubbed = scrubber.scrub_message(&message);

        assert!(!scrubbed.contains(TOKEN));
        assert!(scrubbed.contains("/bot***/getUpdates"));
    }

    #[test]
    fn test_scrub_known_token() {
        let scrubber = SecretScrubber::new(Some(TOKEN)).unwrap();
        let scrubbed = scrubber.scrub_message(&format!("token={TOKEN}"));
        assert_eq!(scrubbed, "token=***");
    }

    #[test]
    fn test_no_scrubbing_needed() {
        let scrubber = SecretScrubber::new(Some(TOKEN)).unwrap();
        let message = "This is a normal log message with no secrets";
        assert_eq!(scrubber.scrub_message(message), message);
    }

    #[test]
    fn test_redact_update() {
        let update = json!({
            "update_id": 5,
            "message": {
                "message_id": 1,
                "from": {"id": 7, "first_name": "Ann", "username": "ann", "is_bot": false},
                "chat": {"id": 7, "type": "private", "title": "Secret"},
                "text": "/link",
                "forward_from_chat": {"id": -1, "username": "chan"}
            }
        });

        let redacted = redact_update(&update);
        let message = &redacted["message"];
        assert_eq!(message["from"]["id"], MASK);
        assert_eq!(message["from"]["first_name"], MASK);
        assert_eq!(message["from"]["username"], MASK);
        assert_eq!(message["from"]["is_bot"], false);
        assert_eq!(message["chat"]["title"], MASK);
        assert_eq!(message["chat"]["id"], 7);
        assert_eq!(message["text"], MASK);
        assert_eq!(message["forward_from_chat"]["username"], MASK);
        assert_eq!(message["forward_from_chat"]["id"], -1);
        assert_eq!(redacted["update_id"], 5);

        // The input is left untouched.
        assert_eq!(update["message"]["text"], "/link");
    }

    #[test]
    fn test_field_matching_respects_segments() {
        assert!(matches_field("message.from.id", "*.from.id"));
        assert!(matches_field("text", "*.text"));
        assert!(!matches_field("message.subtext", "*.text"));
        assert!(!matches_field("message.reply_from.id", "*.from.id"));
    }
}
