#![deny(missing_docs)]

//! # Layer Models
//!
//! Wire types exchanged with the Layer messaging platform.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifier`] | `ConversationId` / `MessageId` and `layer:///` URL parsing |
//! | [`session`] | Nonce and session-token exchange bodies |
//! | [`message`] | Message bodies, parts, senders and receipts |
//! | [`badge`] | Per-user unread counters |

pub mod badge;
pub mod error;
pub mod identifier;
pub mod message;
pub mod session;

// Re-export all public types at crate root for convenience.
pub use badge::*;
pub use error::*;
pub use identifier::*;
pub use message::*;
pub use session::*;
