//! Replay Transport
//!
//! Feeds recorded cube traffic from any line-oriented reader. Keywords are
//! matched without regard to ASCII case.
//!
//! ```text
//! # state read on connect, then a live R
//! initial 12345678 33333333 123456789abc 0000 00000000
//! 12345678 33333333 123456789abc 0000 51436231
//! battery 87
//! disconnect
//! ```

use super::transport::Transport;
use crate::domain::models::TransportEvent;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("line {line}: invalid hex data {text:?}")]
    InvalidHex { line: usize, text: String },
    #[error("line {line}: hex data has an odd number of digits")]
    OddLength { line: usize },
    #[error("line {line}: invalid battery level {text:?}")]
    InvalidBattery { line: usize, text: String },
}

fn parse_hex(line: usize, text: &str) -> Result<Vec<u8>, ReplayError> {
    let digits: String = text.split_whitespace().collect();
    if digits.len() % 2 != 0 {
        return Err(ReplayError::OddLength { line });
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ReplayError::InvalidHex {
                    line,
                    text: text.to_string(),
                })
        })
        .collect()
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.get(keyword.len()..)?;
    text[..keyword.len()].eq_ignore_ascii_case(keyword).then_some(rest)
}

/// Parse one replay line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: usize, text: &str) -> Result<Option<TransportEvent>, ReplayError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    if text.eq_ignore_ascii_case("disconnect") {
        return Ok(Some(TransportEvent::Disconnected));
    }

    if let Some(level) = strip_keyword(text, "battery") {
        let level = level.trim();
        return level
            .parse::<u8>()
            .map(|l| Some(TransportEvent::BatteryLevel(l)))
            .map_err(|_| ReplayError::InvalidBattery {
                line,
                text: level.to_string(),
            });
    }

    if let Some(hex) = strip_keyword(text, "initial") {
        return parse_hex(line, hex).map(|bytes| Some(TransportEvent::InitialState(bytes)));
    }

    parse_hex(line, text).map(|bytes| Some(TransportEvent::Notification(bytes)))
}

pub struct ReplayTransport<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: AsyncBufRead + Unpin> ReplayTransport<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> Transport for ReplayTransport<R> {
    async fn recv(&mut self) -> anyhow::Result<Option<TransportEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            if let Some(event) = parse_line(self.line_number, &line)? {
                debug!("Replaying line {}: {:?}", self.line_number, event);
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}
