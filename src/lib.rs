//! Email triage engine: allow-list overrides and a pretrained classifier decide spam,
//! a bounded mailbox scan reports hits, and flagged messages are moved to quarantine.

pub mod app;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod mail;
pub mod rules;
pub mod tasks;
