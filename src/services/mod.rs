//! Service layer for the relay.
//!
//! This module contains the collaborators driven by the pipeline:
//! - Share link detection (`LinkExtractor`)
//! - Share transfer (`TransferBackend`, `PlatformTransfer`, `DirectTransfer`)
//! - Media metadata lookup (`MetadataClient`)
//! - Webhook notification (`Notifier`)

mod links;
mod metadata;
mod notify;
mod transfer;

pub use links::LinkExtractor;
pub use metadata::MetadataClient;
pub use notify::{Article, ELLIPSIS, News, NewsMessage, Notifier, OVERVIEW_LIMIT, truncate_overview};
pub use transfer::{DirectTransfer, PlatformTransfer, TransferBackend, backend_for};
