//! Google Sheets infrastructure adapter.
//!
//! Implements the [`gateway::Service`] port for `spreadsheets.batchUpdate`
//! and exposes it through the write-only [`SheetWriter`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Authentication headers, URL assembly and response
//! decoding live here. Which updates to send is decided by callers; this crate
//! only delivers them at the configured rate.
//!
//! ## Module Layout
//!
//! | Module   | Contents                                                   |
//! |----------|------------------------------------------------------------|
//! | `batch`  | [`SpreadsheetId`], [`BatchUpdate`], [`BatchUpdateResponse`] |
//! | `client` | [`SheetsClient`]: reqwest-backed `Service` implementation  |
//! | `error`  | [`SheetsError`]                                            |
//! | `writer` | [`SheetWriter`]: `enqueue` / `shutdown`                    |

mod batch;
mod client;
mod error;
mod writer;

pub use batch::{BatchUpdate, BatchUpdateBody, BatchUpdateResponse, SpreadsheetId};
pub use client::{SheetsClient, SHEETS_BASE_URL};
pub use error::SheetsError;
pub use writer::{SheetWriter, SERVICE_NAME};
