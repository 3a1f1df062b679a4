// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk core: types, error definitions, and configuration shared across all
// crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ChannelMode, DetectorConfig, PageSizing, PdfConfig, RectifyConfig, ScaleMode, ScanConfig,
};
pub use error::{Result, ScanwerkError};
pub use types::*;
