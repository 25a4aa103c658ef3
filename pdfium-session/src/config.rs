//! Session configuration
//!
//! Only the form-fill environment is configurable. Values come from the
//! builder methods or from the environment:
//!
//! - `PDFIUM_FORM_HIGHLIGHT_COLOR`: RGB highlight colour in hex (`FFE4DD`,
//!   `0xFFE4DD` and `#FFE4DD` are all accepted)
//! - `PDFIUM_FORM_HIGHLIGHT_ALPHA`: highlight opacity, 0-255
//! - `PDFIUM_DISABLE_FORMS`: `1`/`true`/`yes` skips the form environment

use crate::error::{PdfError, Result};
use std::env;

pub const FORM_HIGHLIGHT_COLOR_ENV: &str = "PDFIUM_FORM_HIGHLIGHT_COLOR";
pub const FORM_HIGHLIGHT_ALPHA_ENV: &str = "PDFIUM_FORM_HIGHLIGHT_ALPHA";
pub const DISABLE_FORMS_ENV: &str = "PDFIUM_DISABLE_FORMS";

/// Default form-field highlight colour (0xRRGGBB).
pub const DEFAULT_HIGHLIGHT_COLOR: u32 = 0xFFE4DD;
/// Default form-field highlight opacity.
pub const DEFAULT_HIGHLIGHT_ALPHA: u8 = 100;

/// Options applied to every document opened through a [`Pdfium`](crate::Pdfium).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfiumConfig {
    form_highlight_color: u32,
    form_highlight_alpha: u8,
    forms_enabled: bool,
}

impl Default for PdfiumConfig {
    fn default() -> Self {
        Self {
            form_highlight_color: DEFAULT_HIGHLIGHT_COLOR,
            form_highlight_alpha: DEFAULT_HIGHLIGHT_ALPHA,
            forms_enabled: true,
        }
    }
}

impl PdfiumConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(PdfError::InvalidParameter(format!("Failed to read {name}: {e}"))),
        })
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Option<String>>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(FORM_HIGHLIGHT_COLOR_ENV)? {
            config.form_highlight_color = parse_color(&value).ok_or_else(|| {
                PdfError::InvalidParameter(format!(
                    "Failed to parse {FORM_HIGHLIGHT_COLOR_ENV}='{value}'"
                ))
            })?;
        }

        if let Some(value) = lookup(FORM_HIGHLIGHT_ALPHA_ENV)? {
            config.form_highlight_alpha = value.trim().parse().map_err(|_| {
                PdfError::InvalidParameter(format!(
                    "Failed to parse {FORM_HIGHLIGHT_ALPHA_ENV}='{value}'"
                ))
            })?;
        }

        if let Some(value) = lookup(DISABLE_FORMS_ENV)? {
            config.forms_enabled = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(config)
    }

    /// Set the form-field highlight colour (0xRRGGBB).
    pub fn form_highlight_color(mut self, color: u32) -> Self {
        self.form_highlight_color = color & 0x00FF_FFFF;
        self
    }

    /// Set the form-field highlight opacity.
    pub fn form_highlight_alpha(mut self, alpha: u8) -> Self {
        self.form_highlight_alpha = alpha;
        self
    }

    /// Enable or disable the form-fill environment.
    pub fn forms_enabled(mut self, enabled: bool) -> Self {
        self.forms_enabled = enabled;
        self
    }

    pub fn highlight_color(&self) -> u32 {
        self.form_highlight_color
    }

    pub fn highlight_alpha(&self) -> u8 {
        self.form_highlight_alpha
    }

    pub fn forms(&self) -> bool {
        self.forms_enabled
    }
}

fn parse_color(value: &str) -> Option<u32> {
    let value = value.trim();
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .or_else(|| value.strip_prefix('#'))
        .unwrap_or(value);
    if hex.is_empty() || hex.len() > 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
