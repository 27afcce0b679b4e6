//! Mitsumori — chat-driven estimate-sheet intake.
//!
//! Turns one free-text estimate message into a structured field record and
//! a deterministic plan of spreadsheet cell writes against a named layout
//! template, gated by a subscription-plan usage check. The concrete
//! spreadsheet backend, messaging platform, billing provider, and user
//! store are collaborator seams (see [`sheets`] and [`usage`]); the core
//! itself is pure and holds no per-user state.
//!
//! See `DESIGN.md` for the grounding ledger and behavior decisions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod intake;
pub mod layout;
pub mod logging;
pub mod planner;
pub mod record;
pub mod sheets;
pub mod usage;
