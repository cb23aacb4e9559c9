//! Book-style paginated embeds driven by reaction events.
//!
//! A [`BookEmbed`] owns an immutable sequence of pages and, per viewing
//! user, a cursor into that sequence. Sending the book renders page 0 and
//! attaches the two directional controls; subsequent reaction events from a
//! user with an active session page back and forth, editing the rendered
//! message in place.
//!
//! Sessions live in a bounded cache with idle expiry instead of growing for
//! the process lifetime: a viewer who walks away stops costing memory.

use crate::transport::{
    ChannelId, Embed, EmbedField, Gateway, GatewayError, MessageRef, ReactionEvent, UserId,
    EMOJI_LEFT, EMOJI_RIGHT,
};
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// One screen's worth of content: an ordered field list and an optional
/// description override. Immutable once the book is constructed.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Fields rendered on this page.
    pub fields: Vec<EmbedField>,
    /// Overrides the book's default description when set.
    pub description: Option<String>,
}

/// Navigation direction decoded from a reaction emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// ⬅️ — towards page 0.
    Previous,
    /// ➡️ — towards the last page.
    Next,
}

impl Direction {
    /// Decode a reaction emoji; anything but the two arrows is meaningless.
    #[must_use]
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            EMOJI_LEFT => Some(Self::Previous),
            EMOJI_RIGHT => Some(Self::Next),
            _ => None,
        }
    }
}

/// Per-user navigation state: the rendered message and the page index.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageCursor {
    message: MessageRef,
    index: usize,
}

/// Eviction bounds for a book's per-user session cache.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// Sessions expire after this long without interaction.
    pub idle: Duration,
    /// Maximum number of concurrently tracked viewers.
    pub capacity: u64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(30 * 60),
            capacity: 10_000,
        }
    }
}

/// A paginated embed with per-user reaction navigation.
pub struct BookEmbed {
    pages: Vec<Page>,
    title: String,
    colour: u32,
    description: String,
    sessions: Cache<UserId, PageCursor>,
}

impl BookEmbed {
    /// Create a book over `pages`.
    ///
    /// An empty page sequence is allowed: the book renders a single empty
    /// page with footer `1/0` and navigation is a no-op.
    #[must_use]
    pub fn new(
        pages: Vec<Page>,
        title: impl Into<String>,
        colour: u32,
        description: impl Into<String>,
        policy: SessionPolicy,
    ) -> Self {
        let sessions = Cache::builder()
            .max_capacity(policy.capacity)
            .time_to_idle(policy.idle)
            .build();
        Self {
            pages,
            title: title.into(),
            colour,
            description: description.into(),
            sessions,
        }
    }

    /// Number of pages in the book.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Render the page at `index` as a complete embed.
    ///
    /// The field list and description are always fully overwritten; the
    /// footer shows `{index + 1}/{page_count}`.
    #[must_use]
    pub fn render(&self, index: usize) -> Embed {
        let mut embed = Embed::new(self.title.clone(), self.colour, self.description.clone());

        if let Some(page) = self.pages.get(index) {
            embed.fields.clone_from(&page.fields);
            if let Some(description) = &page.description {
                embed.description.clone_from(description);
            }
        }

        embed.footer = format!("{}/{}", index + 1, self.pages.len());
        embed
    }

    /// Send page 0 to `channel` and open a navigation session for `user`.
    ///
    /// Attaches exactly the two directional controls and keys the session by
    /// the rendered message.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn send(
        &self,
        gateway: &dyn Gateway,
        channel: ChannelId,
        user: UserId,
    ) -> Result<MessageRef, GatewayError> {
        let embed = self.render(0);
        let message = gateway.send_embed(channel, &embed).await?;
        gateway.add_reaction(message, EMOJI_LEFT).await?;
        gateway.add_reaction(message, EMOJI_RIGHT).await?;

        self.sessions
            .insert(user, PageCursor { message, index: 0 })
            .await;
        debug!("opened book session for user {}", user.0);
        Ok(message)
    }

    /// Route a reaction event to the owning user's session.
    ///
    /// A no-op unless the user has an active session, the event targets that
    /// session's message, and the emoji is one of the two arrows. At either
    /// end of the book the transition is a no-op with no re-render.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures from the in-place edit.
    pub async fn handle_reaction(
        &self,
        gateway: &dyn Gateway,
        event: &ReactionEvent,
    ) -> Result<(), GatewayError> {
        let Some(direction) = Direction::from_emoji(&event.emoji) else {
            return Ok(());
        };
        let Some(cursor) = self.sessions.get(&event.user).await else {
            return Ok(());
        };
        if cursor.message != event.message {
            return Ok(());
        }

        let next = match direction {
            Direction::Previous => cursor.index.checked_sub(1),
            Direction::Next if cursor.index + 1 < self.pages.len() => Some(cursor.index + 1),
            Direction::Next => None,
        };
        let Some(index) = next else {
            return Ok(());
        };

        let embed = self.render(index);
        gateway.edit_embed(cursor.message, &embed).await?;
        self.sessions
            .insert(
                event.user,
                PageCursor {
                    message: cursor.message,
                    index,
                },
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Gateway that records every outbound call.
    #[derive(Default)]
    struct RecordingGateway {
        next_id: AtomicU64,
        sent: Mutex<Vec<(ChannelId, Embed)>>,
        edits: Mutex<Vec<(MessageRef, Embed)>>,
        reactions: Mutex<Vec<(MessageRef, String)>>,
    }

    impl RecordingGateway {
        fn edit_count(&self) -> usize {
            self.edits.lock().expect("lock").len()
        }

        fn last_embed(&self) -> Embed {
            let edits = self.edits.lock().expect("lock");
            if let Some((_, embed)) = edits.last() {
                return embed.clone();
            }
            let sent = self.sent.lock().expect("lock");
            sent.last().map(|(_, e)| e.clone()).expect("nothing sent")
        }
    }

    #[async_trait]
    impl Gateway for RecordingGateway {
        async fn send_embed(
            &self,
            channel: ChannelId,
            embed: &Embed,
        ) -> Result<MessageRef, GatewayError> {
            let message = MessageRef {
                channel,
                message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
            };
            self.sent.lock().expect("lock").push((channel, embed.clone()));
            Ok(message)
        }

        async fn edit_embed(
            &self,
            message: MessageRef,
            embed: &Embed,
        ) -> Result<(), GatewayError> {
            self.edits.lock().expect("lock").push((message, embed.clone()));
            Ok(())
        }

        async fn add_reaction(
            &self,
            message: MessageRef,
            emoji: &str,
        ) -> Result<(), GatewayError> {
            self.reactions
                .lock()
                .expect("lock")
                .push((message, emoji.to_string()));
            Ok(())
        }
    }

    fn numbered_book(pages: usize) -> BookEmbed {
        let pages = (0..pages)
            .map(|i| Page {
                fields: Vec::new(),
                description: Some(format!("page {i}")),
            })
            .collect();
        BookEmbed::new(pages, "Test", 0x00e3b6, "default", SessionPolicy::default())
    }

    fn reaction(user: UserId, message: MessageRef, emoji: &str) -> ReactionEvent {
        ReactionEvent {
            user,
            message,
            emoji: emoji.to_string(),
        }
    }

    #[tokio::test]
    async fn send_renders_page_zero_with_both_controls() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);

        let message = book
            .send(&gateway, ChannelId(1), UserId(7))
            .await
            .expect("send");

        let embed = gateway.last_embed();
        assert_eq!(embed.description, "page 0");
        assert_eq!(embed.footer, "1/3");

        let reactions = gateway.reactions.lock().expect("lock");
        assert_eq!(
            *reactions,
            vec![
                (message, EMOJI_LEFT.to_string()),
                (message, EMOJI_RIGHT.to_string())
            ]
        );
    }

    #[tokio::test]
    async fn next_advances_and_clamps_at_last_page() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);
        let user = UserId(7);
        let message = book.send(&gateway, ChannelId(1), user).await.expect("send");

        // N - 1 next presses walk from page 0 to page N-1.
        for _ in 0..2 {
            book.handle_reaction(&gateway, &reaction(user, message, EMOJI_RIGHT))
                .await
                .expect("reaction");
        }
        assert_eq!(gateway.edit_count(), 2);
        assert_eq!(gateway.last_embed().footer, "3/3");

        // One more is a no-op: no edit, same content.
        book.handle_reaction(&gateway, &reaction(user, message, EMOJI_RIGHT))
            .await
            .expect("reaction");
        assert_eq!(gateway.edit_count(), 2);
        assert_eq!(gateway.last_embed().footer, "3/3");
    }

    #[tokio::test]
    async fn previous_at_page_zero_is_a_no_op() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);
        let user = UserId(7);
        let message = book.send(&gateway, ChannelId(1), user).await.expect("send");

        book.handle_reaction(&gateway, &reaction(user, message, EMOJI_LEFT))
            .await
            .expect("reaction");
        assert_eq!(gateway.edit_count(), 0);
    }

    #[tokio::test]
    async fn previous_steps_back_after_advancing() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);
        let user = UserId(7);
        let message = book.send(&gateway, ChannelId(1), user).await.expect("send");

        book.handle_reaction(&gateway, &reaction(user, message, EMOJI_RIGHT))
            .await
            .expect("next");
        book.handle_reaction(&gateway, &reaction(user, message, EMOJI_LEFT))
            .await
            .expect("previous");

        assert_eq!(gateway.last_embed().footer, "1/3");
        assert_eq!(gateway.last_embed().description, "page 0");
    }

    #[tokio::test]
    async fn users_keep_independent_cursors() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);
        let alice = UserId(1);
        let bob = UserId(2);

        let alice_msg = book.send(&gateway, ChannelId(1), alice).await.expect("send");
        let bob_msg = book.send(&gateway, ChannelId(1), bob).await.expect("send");

        book.handle_reaction(&gateway, &reaction(alice, alice_msg, EMOJI_RIGHT))
            .await
            .expect("alice next");

        // Bob's cursor is still on page 0: previous is a no-op for him.
        let edits_before = gateway.edit_count();
        book.handle_reaction(&gateway, &reaction(bob, bob_msg, EMOJI_LEFT))
            .await
            .expect("bob previous");
        assert_eq!(gateway.edit_count(), edits_before);
    }

    #[tokio::test]
    async fn reaction_on_foreign_message_is_ignored() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);
        let user = UserId(7);
        book.send(&gateway, ChannelId(1), user).await.expect("send");

        let other = MessageRef {
            channel: ChannelId(1),
            message_id: 999,
        };
        book.handle_reaction(&gateway, &reaction(user, other, EMOJI_RIGHT))
            .await
            .expect("reaction");
        assert_eq!(gateway.edit_count(), 0);
    }

    #[tokio::test]
    async fn unrelated_emoji_is_ignored() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);
        let user = UserId(7);
        let message = book.send(&gateway, ChannelId(1), user).await.expect("send");

        book.handle_reaction(&gateway, &reaction(user, message, "🦀"))
            .await
            .expect("reaction");
        assert_eq!(gateway.edit_count(), 0);
    }

    #[tokio::test]
    async fn user_without_session_is_ignored() {
        let gateway = RecordingGateway::default();
        let book = numbered_book(3);
        let message = book
            .send(&gateway, ChannelId(1), UserId(7))
            .await
            .expect("send");

        book.handle_reaction(&gateway, &reaction(UserId(8), message, EMOJI_RIGHT))
            .await
            .expect("reaction");
        assert_eq!(gateway.edit_count(), 0);
    }

    #[tokio::test]
    async fn empty_book_renders_one_over_zero() {
        let gateway = RecordingGateway::default();
        let book = BookEmbed::new(
            Vec::new(),
            "Empty",
            0,
            "nothing here",
            SessionPolicy::default(),
        );
        let user = UserId(7);
        let message = book.send(&gateway, ChannelId(1), user).await.expect("send");

        let embed = gateway.last_embed();
        assert_eq!(embed.footer, "1/0");
        assert!(embed.fields.is_empty());

        // Navigation over an empty book never edits.
        book.handle_reaction(&gateway, &reaction(user, message, EMOJI_RIGHT))
            .await
            .expect("reaction");
        book.handle_reaction(&gateway, &reaction(user, message, EMOJI_LEFT))
            .await
            .expect("reaction");
        assert_eq!(gateway.edit_count(), 0);
    }

    #[test]
    fn direction_decodes_only_the_arrows() {
        assert_eq!(Direction::from_emoji(EMOJI_LEFT), Some(Direction::Previous));
        assert_eq!(Direction::from_emoji(EMOJI_RIGHT), Some(Direction::Next));
        assert_eq!(Direction::from_emoji("👍"), None);
    }
}
