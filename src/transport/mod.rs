//! Chat gateway abstraction.
//!
//! The bot never talks to a messaging platform directly. Everything it needs
//! from the transport — sending and editing embeds, attaching reaction
//! controls, and the shape of inbound events — lives behind the [`Gateway`]
//! trait, so the core stays testable and platform-independent.

/// Minimal line-oriented gateway for local runs.
pub mod console;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Left navigation control attached to paginated sends.
pub const EMOJI_LEFT: &str = "\u{2b05}\u{fe0f}";
/// Right navigation control attached to paginated sends.
pub const EMOJI_RIGHT: &str = "\u{27a1}\u{fe0f}";

/// Platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Platform channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

/// Handle to a message the bot has rendered, used for in-place edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel the message was sent to.
    pub channel: ChannelId,
    /// Platform message identifier.
    pub message_id: u64,
}

/// One name/value column inside an embed.
///
/// Fields are built up incrementally while paginating a listing; `clear`
/// resets a builder field between pages. Finalized pages never mutate their
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedField {
    /// Column header.
    pub name: String,
    /// Column body.
    pub value: String,
    /// Whether the field renders inline next to its siblings.
    pub inline: bool,
}

impl EmbedField {
    /// Create an inline or block field with an empty value.
    #[must_use]
    pub fn new(name: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            inline,
        }
    }

    /// Reset all three attributes to their defaults.
    pub fn clear(&mut self) {
        self.name.clear();
        self.value.clear();
        self.inline = false;
    }
}

/// A rich outbound message: title, colour, description, ordered fields and a
/// footer line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    /// Embed title.
    pub title: String,
    /// Accent colour, 0xRRGGBB.
    pub colour: u32,
    /// Body text shown above the fields.
    pub description: String,
    /// Ordered field list.
    pub fields: Vec<EmbedField>,
    /// Footer text (page counter for paginated sends).
    pub footer: String,
}

impl Embed {
    /// Create an embed with no fields and an empty footer.
    #[must_use]
    pub fn new(title: impl Into<String>, colour: u32, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            colour,
            description: description.into(),
            fields: Vec::new(),
            footer: String::new(),
        }
    }
}

/// A reaction added to or removed from a message.
///
/// Adds and removals are equivalent navigation inputs: flipping a control
/// either way pages in that direction.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    /// User who flipped the reaction.
    pub user: UserId,
    /// Message the reaction sits on.
    pub message: MessageRef,
    /// Emoji identifier as delivered by the platform.
    pub emoji: String,
}

/// An inbound text command.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Author of the message.
    pub author: UserId,
    /// Channel the message arrived in.
    pub channel: ChannelId,
    /// Raw message text.
    pub text: String,
}

/// Anything the gateway can deliver to the bot.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A text message.
    Message(InboundMessage),
    /// A reaction add or remove.
    Reaction(ReactionEvent),
}

/// Errors surfaced by a gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The platform rejected or failed to deliver an outbound call.
    #[error("gateway send failed: {0}")]
    Send(String),
}

/// Outbound half of the chat transport.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Render an embed as a new message and return a handle to it.
    async fn send_embed(&self, channel: ChannelId, embed: &Embed)
        -> Result<MessageRef, GatewayError>;

    /// Re-render an existing message in place.
    async fn edit_embed(&self, message: MessageRef, embed: &Embed) -> Result<(), GatewayError>;

    /// Attach a reaction control to a message.
    async fn add_reaction(&self, message: MessageRef, emoji: &str) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    async fn send_embed(
        &self,
        channel: ChannelId,
        embed: &Embed,
    ) -> Result<MessageRef, GatewayError> {
        (**self).send_embed(channel, embed).await
    }

    async fn edit_embed(&self, message: MessageRef, embed: &Embed) -> Result<(), GatewayError> {
        (**self).edit_embed(message, embed).await
    }

    async fn add_reaction(&self, message: MessageRef, emoji: &str) -> Result<(), GatewayError> {
        (**self).add_reaction(message, emoji).await
    }
}
