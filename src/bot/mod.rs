//! Command dispatch and embed construction.
//!
//! [`CurryBot`] routes inbound gateway events: text commands go through the
//! grammar in [`command`] and into the converter, reaction events go to the
//! currencies book. Domain errors (bad commands, unknown codes) are rendered
//! as error embeds; infrastructure errors are logged and answered with a
//! generic failure message instead of crashing the process.

/// Command grammar.
pub mod command;

use crate::book::{BookEmbed, Page, SessionPolicy};
use crate::cache::CacheError;
use crate::convert::CurrencyConverter;
use crate::transport::{
    ChannelId, Embed, EmbedField, Gateway, GatewayError, InboundEvent, InboundMessage,
    ReactionEvent, UserId,
};
use command::{Command, PREFIX};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

const COLOUR_ERROR: u32 = 0x00ff_2c00;
const COLOUR_CONVERSION: u32 = 0x0000_e3b6;
const COLOUR_HELP: u32 = 0x00f0_c500;

/// Shown when an infrastructure error leaves a command unanswerable.
const GENERIC_FAILURE: &str = "Something went wrong. Try again later.";

/// The currency bot: converter, the currencies book and dispatch.
pub struct CurryBot<G: Gateway> {
    gateway: G,
    converter: CurrencyConverter,
    /// Rebuilt whenever a catalog refresh occurs; rebuilding discards the
    /// previous book's sessions along with its pages.
    book: RwLock<Option<Arc<BookEmbed>>>,
    own_user: UserId,
    page_size: usize,
    sessions: SessionPolicy,
}

impl<G: Gateway> CurryBot<G> {
    /// Create a bot over a gateway and converter.
    ///
    /// Events authored by `own_user` (the bot itself) are ignored.
    pub fn new(
        gateway: G,
        converter: CurrencyConverter,
        own_user: UserId,
        page_size: usize,
        sessions: SessionPolicy,
    ) -> Self {
        Self {
            gateway,
            converter,
            book: RwLock::new(None),
            own_user,
            page_size,
            sessions,
        }
    }

    /// The gateway this bot sends through.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Route one inbound event.
    ///
    /// # Errors
    ///
    /// Only gateway delivery failures propagate; command and infrastructure
    /// errors are answered in-channel.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<(), GatewayError> {
        match event {
            InboundEvent::Message(msg) if msg.author != self.own_user => {
                self.handle_message(msg).await
            }
            InboundEvent::Reaction(reaction) if reaction.user != self.own_user => {
                self.handle_reaction(reaction).await
            }
            _ => Ok(()),
        }
    }

    async fn handle_message(&self, msg: &InboundMessage) -> Result<(), GatewayError> {
        let Some(body) = msg.text.strip_prefix(PREFIX) else {
            return Ok(());
        };

        match Command::parse(body) {
            Ok(Command::List) => self.command_list(msg.channel, msg.author).await,
            Ok(Command::Convert { amount, from, to }) => {
                self.command_convert(msg.channel, amount, &from, &to).await
            }
            Ok(Command::Help) => {
                self.gateway
                    .send_embed(msg.channel, &help_embed())
                    .await
                    .map(|_| ())
            }
            Err(e) => {
                self.gateway
                    .send_embed(msg.channel, &error_embed(&e.to_string()))
                    .await
                    .map(|_| ())
            }
        }
    }

    async fn handle_reaction(&self, reaction: &ReactionEvent) -> Result<(), GatewayError> {
        let book = self.book.read().await.clone();
        if let Some(book) = book {
            book.handle_reaction(&self.gateway, reaction).await?;
        }
        Ok(())
    }

    /// `!list`: refresh the catalog, rebuild the book if the data changed,
    /// and open it for the requesting user.
    async fn command_list(&self, channel: ChannelId, user: UserId) -> Result<(), GatewayError> {
        let refreshed = match self.converter.refresh_catalog().await {
            Ok(refreshed) => refreshed,
            Err(e) => return self.report_failure(channel, &e).await,
        };

        let mut slot = self.book.write().await;
        if refreshed || slot.is_none() {
            let pairs = match self.converter.pairs().await {
                Ok(pairs) => pairs,
                Err(e) => {
                    drop(slot);
                    return self.report_failure(channel, &e).await;
                }
            };
            info!("rebuilding currencies book ({} entries)", pairs.len());
            *slot = Some(Arc::new(BookEmbed::new(
                build_currency_pages(&pairs, self.page_size),
                "Currencies",
                COLOUR_CONVERSION,
                "Available currencies.",
                self.sessions,
            )));
        }
        let book = slot.as_ref().map(Arc::clone);
        drop(slot);

        if let Some(book) = book {
            book.send(&self.gateway, channel, user).await?;
        }
        Ok(())
    }

    /// `!convert`: refresh rates, then convert or report an invalid code.
    async fn command_convert(
        &self,
        channel: ChannelId,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<(), GatewayError> {
        if let Err(e) = self.converter.refresh_rates().await {
            return self.report_failure(channel, &e).await;
        }

        match self.converter.convert(amount, from, to).await {
            Ok(Some(converted)) => {
                let embed = conversion_embed(amount, from, converted, to);
                self.gateway.send_embed(channel, &embed).await.map(|_| ())
            }
            Ok(None) => self
                .gateway
                .send_embed(channel, &error_embed("Invalid currency code."))
                .await
                .map(|_| ()),
            Err(e) => self.report_failure(channel, &e).await,
        }
    }

    async fn report_failure(
        &self,
        channel: ChannelId,
        cause: &CacheError,
    ) -> Result<(), GatewayError> {
        error!("command failed: {}", cause);
        self.gateway
            .send_embed(channel, &error_embed(GENERIC_FAILURE))
            .await
            .map(|_| ())
    }
}

/// Error embed with a specific user-facing message.
#[must_use]
pub fn error_embed(message: &str) -> Embed {
    Embed::new("Error", COLOUR_ERROR, message)
}

/// Static help embed listing the available commands.
#[must_use]
pub fn help_embed() -> Embed {
    let mut embed = Embed::new("Help", COLOUR_HELP, "Available commands.");
    embed.fields.push(EmbedField {
        name: "list".to_string(),
        value: "Lists the available currencies. ```!list```".to_string(),
        inline: false,
    });
    embed.fields.push(EmbedField {
        name: "convert".to_string(),
        value: "Converts an amount from one currency unit to another. \
                ```!convert {AMOUNT} from {INPUT_CURRENCY} to {OUTPUT_CURRENCY}```"
            .to_string(),
        inline: false,
    });
    embed
}

/// Conversion result embed: both amounts with flags and bold codes.
#[must_use]
pub fn conversion_embed(amount: f64, from: &str, converted: f64, to: &str) -> Embed {
    let description = format!(
        "{} {} **{}**\u{2935}\u{fe0f}\n{} {} **{}**",
        flag_emoji(from),
        format_amount(amount),
        from,
        flag_emoji(to),
        format_amount(converted),
        to,
    );
    Embed::new("Conversion", COLOUR_CONVERSION, description)
}

/// Build the Flag/Name/Code column pages for the currencies book.
///
/// Entries are laid out `page_size` per page in catalog order; the last page
/// holds the remainder.
#[must_use]
pub fn build_currency_pages(pairs: &[(String, String)], page_size: usize) -> Vec<Page> {
    let page_size = page_size.max(1);
    let mut pages = Vec::new();

    let mut flags = EmbedField::new("Flag", true);
    let mut names = EmbedField::new("Name", true);
    let mut codes = EmbedField::new("Code", true);

    for (i, (name, code)) in pairs.iter().enumerate() {
        if i != 0 && i % page_size == 0 {
            pages.push(Page {
                fields: vec![flags.clone(), names.clone(), codes.clone()],
                description: None,
            });
            flags.value.clear();
            names.value.clear();
            codes.value.clear();
        }

        flags.value.push_str(&flag_emoji(code));
        flags.value.push('\n');
        names.value.push_str(name);
        names.value.push('\n');
        codes.value.push_str(code);
        codes.value.push('\n');
    }

    if !pairs.is_empty() {
        pages.push(Page {
            fields: vec![flags, names, codes],
            description: None,
        });
    }
    pages
}

/// Flag emoji for a currency code: its first two letters as regional
/// indicator symbols (the country prefix of an ISO 4217 code).
#[must_use]
pub fn flag_emoji(code: &str) -> String {
    code.chars()
        .take(2)
        .filter(char::is_ascii_alphabetic)
        .filter_map(|c| char::from_u32(0x1F1E6 + (c.to_ascii_lowercase() as u32 - 'a' as u32)))
        .collect()
}

/// Format an amount with thousands separators and two decimals.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    // Sign follows the rounded magnitude; -0.004 rounds to 0.00, not -0.00.
    let sign = if amount < 0.0 && formatted != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}
