//! Customer-service agent pieces
//!
//! - [`CustomerService`]: reply selection, an optional generative path
//!   with an always-available ordered rule table behind it
//! - [`ScriptedClient`]: the simulated caller
//! - [`Supervisor`]: the turn-cap guardrail

pub mod client;
pub mod reply;
pub mod supervisor;

pub use client::ScriptedClient;
pub use reply::{CustomerService, GenerativeReplier, RuleReplySelector, TECHNICAL_DIFFICULTY_REPLY};
pub use supervisor::Supervisor;
