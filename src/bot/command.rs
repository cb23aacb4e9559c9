//! Command grammar for inbound chat messages.
//!
//! Commands start with `!`. The convert form is a small fixed grammar,
//! `convert <amount> from <CODE> to <CODE>`, validated token by token with
//! one error per failure point. Error display strings double as the
//! user-facing messages.

use thiserror::Error;

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List the available currencies.
    List,
    /// Convert an amount between two currency codes.
    Convert {
        /// Amount in the source currency.
        amount: f64,
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
    },
    /// Show the help embed.
    Help,
}

/// Command parsing failures, one variant per failure point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command word is not recognised.
    #[error("Unknown command. Use `!help` to display the command list.")]
    UnknownCommand,
    /// `convert` was given no arguments at all.
    #[error("Expected arguments.")]
    ExpectedArguments,
    /// The amount token is not a number.
    #[error("Invalid amount.")]
    InvalidAmount,
    /// A grammar keyword is missing or misplaced.
    #[error("Expected keyword \"{0}\".")]
    ExpectedKeyword(&'static str),
    /// A currency code token is missing.
    #[error("Expected a currency code.")]
    ExpectedCurrencyCode,
}

/// Command prefix: every command starts with this control character.
pub const PREFIX: char = '!';

impl Command {
    /// Parse the body of a command message (text after the `!` prefix).
    ///
    /// # Errors
    ///
    /// A [`CommandError`] describing the first failing token.
    pub fn parse(body: &str) -> Result<Self, CommandError> {
        let mut tokens = body.split_whitespace();
        match tokens.next() {
            Some("list") => Ok(Self::List),
            Some("help") => Ok(Self::Help),
            Some("convert") => parse_convert(tokens),
            _ => Err(CommandError::UnknownCommand),
        }
    }
}

fn parse_convert<'a, I>(mut tokens: I) -> Result<Command, CommandError>
where
    I: Iterator<Item = &'a str>,
{
    let amount = tokens.next().ok_or(CommandError::ExpectedArguments)?;
    let amount: f64 = amount.parse().map_err(|_| CommandError::InvalidAmount)?;

    expect_keyword(tokens.next(), "from")?;
    let from = tokens
        .next()
        .ok_or(CommandError::ExpectedCurrencyCode)?
        .to_string();

    expect_keyword(tokens.next(), "to")?;
    let to = tokens
        .next()
        .ok_or(CommandError::ExpectedCurrencyCode)?
        .to_string();

    Ok(Command::Convert { amount, from, to })
}

fn expect_keyword(token: Option<&str>, keyword: &'static str) -> Result<(), CommandError> {
    match token {
        Some(t) if t == keyword => Ok(()),
        _ => Err(CommandError::ExpectedKeyword(keyword)),
    }
}
