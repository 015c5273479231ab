//! # Twitch IRC lines
//!
//! Parsing of inbound chat lines and construction of the outbound handshake.
//! Only what a read-only, anonymous capture needs is understood: liveness
//! probes and `PRIVMSG` chat messages carrying the `display-name` tag.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

/// Password accepted by the chat server for anonymous logins
pub const ANONYMOUS_PASS: &str = "SCHMOOPIIE";
pub const ANONYMOUS_NICK: &str = "justinfan12345";

static DISPLAY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^@|;)display-name=([^;]*)").unwrap());

static PREFIX_NICK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s):([A-Za-z0-9_]+)!").unwrap());

static PRIVMSG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PRIVMSG #[^\s]+ :(.*)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    /// Liveness probe, carrying the payload to echo back
    Ping(String),
    Privmsg {
        username: String,
        text: String,
    },
    Other,
}

/// Classifies one inbound line (without its `\r\n` terminator).
///
/// # Returns
/// * `Ok(ChatLine::Privmsg)` with the sender's display name, falling back to
///   the nick of the line prefix when the tag is empty or absent.
/// * `Err(Error::ParseError)` if the line carries the `PRIVMSG` marker but the
///   sender or the body cannot be extracted.
pub fn parse_line(line: &str) -> Result<ChatLine, Error> {
    if let Some(payload) = line.strip_prefix("PING") {
        return Ok(ChatLine::Ping(payload.trim().to_string()));
    }

    if !line.contains("PRIVMSG") {
        return Ok(ChatLine::Other);
    }

    let text = PRIVMSG_RE
        .captures(line)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .ok_or(Error::ParseError("PRIVMSG line without a message body"))?;

    // tags only exist in the leading `@...` segment, never in the body
    let tags = line
        .starts_with('@')
        .then(|| line.split_once(' ').map_or(line, |(tags, _)| tags));

    let username = tags
        .and_then(|tags| DISPLAY_NAME_RE.captures(tags))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .filter(|name| !name.is_empty())
        .or_else(|| {
            PREFIX_NICK_RE
                .captures(line)
                .and_then(|cap| cap.get(1))
                .map(|m| m.as_str())
        })
        .ok_or(Error::ParseError("PRIVMSG line without a sender"))?;

    Ok(ChatLine::Privmsg {
        username: username.to_string(),
        text: text.to_string(),
    })
}

/// Lines sent right after connecting: anonymous login, capabilities and join.
pub fn handshake(nickname: &str, channel: &str) -> Vec<String> {
    vec![
        format!("PASS {ANONYMOUS_PASS}\r\n"),
        format!("NICK {nickname}\r\n"),
        format!("USER {nickname} 8 * :{nickname}\r\n"),
        "CAP REQ :twitch.tv/commands twitch.tv/tags\r\n".to_string(),
        format!("JOIN #{}\r\n", channel.to_lowercase()),
    ]
}

/// Reply to a `PING` carrying `payload`
pub fn pong(payload: &str) -> String {
    if payload.is_empty() {
        "PONG :tmi.twitch.tv\r\n".to_string()
    } else {
        format!("PONG {payload}\r\n")
    }
}
