//! Line-oriented gateway for running the bot locally.
//!
//! Renders embeds to stdout and turns stdin lines into inbound events:
//! `!…` lines are commands, `<` and `>` flip the navigation reactions on the
//! most recently rendered message. Bootstrap glue only — the real messaging
//! platform delivers these over its own gateway.

use super::{
    ChannelId, Embed, Gateway, GatewayError, InboundEvent, InboundMessage, MessageRef,
    ReactionEvent, UserId, EMOJI_LEFT, EMOJI_RIGHT,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Gateway over stdout/stdin.
#[derive(Default)]
pub struct ConsoleGateway {
    next_id: AtomicU64,
    last_sent: Mutex<Option<MessageRef>>,
}

impl ConsoleGateway {
    /// Create a console gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn one stdin line into an inbound event.
    ///
    /// Returns `None` for blank lines and for navigation input before
    /// anything has been rendered.
    pub fn event_from_line(&self, user: UserId, channel: ChannelId, line: &str) -> Option<InboundEvent> {
        let line = line.trim();
        match line {
            "" => None,
            "<" | ">" => {
                let message = (*self.last_sent.lock().ok()?)?;
                let emoji = if line == "<" { EMOJI_LEFT } else { EMOJI_RIGHT };
                Some(InboundEvent::Reaction(ReactionEvent {
                    user,
                    message,
                    emoji: emoji.to_string(),
                }))
            }
            _ => Some(InboundEvent::Message(InboundMessage {
                author: user,
                channel,
                text: line.to_string(),
            })),
        }
    }

    fn print_embed(message: MessageRef, embed: &Embed) {
        println!("┌─ [{}] {}", message.message_id, embed.title);
        if !embed.description.is_empty() {
            println!("│ {}", embed.description.replace('\n', "\n│ "));
        }
        for field in &embed.fields {
            println!("│ ── {} ──", field.name);
            for line in field.value.lines() {
                println!("│ {line}");
            }
        }
        println!("└─ {}", embed.footer);
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    async fn send_embed(
        &self,
        channel: ChannelId,
        embed: &Embed,
    ) -> Result<MessageRef, GatewayError> {
        let message = MessageRef {
            channel,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        Self::print_embed(message, embed);
        if let Ok(mut last) = self.last_sent.lock() {
            *last = Some(message);
        }
        Ok(message)
    }

    async fn edit_embed(&self, message: MessageRef, embed: &Embed) -> Result<(), GatewayError> {
        Self::print_embed(message, embed);
        Ok(())
    }

    async fn add_reaction(&self, _message: MessageRef, _emoji: &str) -> Result<(), GatewayError> {
        // Console navigation uses `<` / `>` instead of visible controls.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lines_map_to_events() {
        let gateway = ConsoleGateway::new();
        let user = UserId(1);
        let channel = ChannelId(0);

        assert!(gateway.event_from_line(user, channel, "").is_none());
        assert!(
            gateway.event_from_line(user, channel, ">").is_none(),
            "navigation before any render has no target message"
        );

        let Some(InboundEvent::Message(msg)) =
            gateway.event_from_line(user, channel, "!help")
        else {
            panic!("expected a message event");
        };
        assert_eq!(msg.text, "!help");

        let message = gateway
            .send_embed(channel, &Embed::new("T", 0, ""))
            .await
            .expect("send");
        let Some(InboundEvent::Reaction(reaction)) =
            gateway.event_from_line(user, channel, "<")
        else {
            panic!("expected a reaction event");
        };
        assert_eq!(reaction.message, message);
        assert_eq!(reaction.emoji, EMOJI_LEFT);
    }
}
