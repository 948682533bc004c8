//! Link and handler configuration.
//!
//! ```toml
//! [serial]
//! baud = 115200
//! data_bits = 8
//! parity = "none"
//! stop_bits = 1
//!
//! [handler]
//! completion = "interrupt"
//! wait_budget = 1000
//! banner = true
//! ```

use core::fmt;

use serde::Deserialize;

use crate::error::{LinkError, Result};

/// How the handler waits for the accelerator to finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// Busy-poll the status register.
    #[default]
    Polled,
    /// Wait for the completion interrupt.
    Interrupt,
}

impl fmt::Display for CompletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionMode::Polled => f.write_str("Polled"),
            CompletionMode::Interrupt => f.write_str("Interrupt-driven"),
        }
    }
}

/// Serial parity setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit.
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

/// Character format of the serial link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSettings {
    /// Line rate in bits per second.
    pub baud: u32,
    /// Data bits per character, 5 to 8.
    pub data_bits: u8,
    /// Parity bit.
    pub parity: Parity,
    /// Stop bits, 1 or 2.
    pub stop_bits: u8,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud: 115_200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
        }
    }
}

impl SerialSettings {
    /// Rejects settings no UART can run.
    pub fn validate(&self) -> Result<()> {
        if self.baud == 0 {
            return Err(LinkError::InvalidConfig(
                "baud rate must be non-zero".into(),
            ));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(LinkError::InvalidConfig(format!(
                "data_bits must be 5..=8, got {}",
                self.data_bits
            )));
        }
        if !matches!(self.stop_bits, 1 | 2) {
            return Err(LinkError::InvalidConfig(format!(
                "stop_bits must be 1 or 2, got {}",
                self.stop_bits
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        write!(
            f,
            "{} baud {}{}{}",
            self.baud, self.data_bits, parity, self.stop_bits
        )
    }
}

/// How the protocol handler drives the accelerator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerConfig {
    /// Completion wait strategy.
    pub completion: CompletionMode,
    /// Upper bound on ticks spent in any single wait; `None` waits forever.
    pub wait_budget: Option<u64>,
    /// Write a text banner to the link before the first frame.
    pub banner: bool,
}

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// `[serial]` section.
    pub serial: SerialSettings,
    /// `[handler]` section.
    pub handler: HandlerConfig,
}

impl LinkConfig {
    /// Parses and validates a TOML document; missing keys take defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: LinkConfig = toml::from_str(input)?;
        config.serial.validate()?;
        Ok(config)
    }
}
