//! Property tests for the update cursor and command classification

mod common;

use std::time::Duration;

use proptest::prelude::*;

use common::{text_update, FakeChatClient, BOT_USERNAME};
use gcservant::domain::models::RawUpdate;
use gcservant::services::classifier::{classify, UpdateKind};
use gcservant::services::UpdateFetcher;

fn batch(ids: &[i64]) -> Vec<RawUpdate> {
    ids.iter().map(|&id| text_update(id, 1, "hello")).collect()
}

proptest! {
    /// Property: the cursor is the id of the last item of the last
    /// non-empty batch, and empty batches leave it unchanged.
    #[test]
    fn prop_cursor_tracks_last_item(
        batches in prop::collection::vec(prop::collection::vec(0i64..10_000, 0..5), 0..10)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let client = FakeChatClient::new();
            for ids in &batches {
                client.push_batch(batch(ids));
            }
            let mut fetcher = UpdateFetcher::new(client.clone(), Duration::from_secs(1), Duration::from_secs(2));

            let mut expected = None;
            for ids in &batches {
                let received = fetcher.fetch().await.unwrap();
                prop_assert_eq!(received.len(), ids.len());
                if let Some(&last) = ids.last() {
                    expected = Some(last);
                }
                prop_assert_eq!(fetcher.cursor(), expected);
                prop_assert_eq!(fetcher.offset(), expected.map(|id| id + 1));
            }

            // An idle poll changes nothing.
            let idle = fetcher.fetch().await.unwrap();
            prop_assert!(idle.is_empty());
            prop_assert_eq!(fetcher.cursor(), expected);
            Ok(())
        })?;
    }

    /// Property: a command that does not open the message is never dispatched.
    #[test]
    fn prop_non_leading_command_not_dispatched(
        prefix in "[a-z]{1,8}",
        name in "[a-z]{1,10}"
    ) {
        let update = text_update(1, 1, &format!("{prefix} /{name}"));
        let is_command = matches!(classify(&update), UpdateKind::CommandMessage { .. });
        prop_assert!(!is_command);
    }

    /// Property: a leading command keeps its name and arguments.
    #[test]
    fn prop_leading_command_parsed(
        name in "[a-z]{1,10}",
        args in prop::collection::vec("[a-z0-9]{1,6}", 0..4)
    ) {
        let text = std::iter::once(format!("/{name}"))
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        match classify(&text_update(1, 1, &text)) {
            UpdateKind::CommandMessage { command, .. } => {
                prop_assert_eq!(&command.name, &name);
                prop_assert_eq!(&command.raw_args, &args);
                prop_assert!(command.target_bot.is_none());
                prop_assert!(command.is_addressed_to(BOT_USERNAME));
            }
            other => prop_assert!(false, "expected a command, got {}", other.label()),
        }
    }

    /// Property: a command addressed to another bot is never ours.
    #[test]
    fn prop_other_bot_not_addressed(
        name in "[a-z]{1,10}",
        bot in "[a-z]{3,12}bot"
    ) {
        prop_assume!(!bot.eq_ignore_ascii_case(BOT_USERNAME));

        match classify(&text_update(1, 1, &format!("/{name}@{bot}"))) {
            UpdateKind::CommandMessage { command, .. } => {
                prop_assert_eq!(command.target_bot.as_deref(), Some(bot.as_str()));
                prop_assert!(!command.is_addressed_to(BOT_USERNAME));
            }
            other => prop_assert!(false, "expected a command, got {}", other.label()),
        }
    }
}
