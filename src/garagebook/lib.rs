//! # Garagebook Architecture
//!
//! Garagebook keeps the books of a small auto-repair workshop: clients and
//! their vehicles, employees, the catalog of services and parts, purchases and
//! monthly expenses. It is a library first; the `garagebook` binary is one
//! client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs, print.rs)                           │
//! │  - Parses arguments, renders CmdResult, owns exit codes     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Resolves id prefixes, fills default dates                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - Validation and business logic, returns CmdResult         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Shop (shop.rs, rules.rs, events.rs, ledger.rs)             │
//! │  - Repositories per collection, change events, rules        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence (store/, entity.rs)                            │
//! │  - Whole-collection JSON files, adapters, obfuscation       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Change events
//!
//! A repository never notifies anyone itself. Every mutation returns a
//! [`store::repository::Committed`] describing what happened, and
//! [`shop::Shop`] routes it to the matching channel of its
//! [`shop::EventBus`]. Cross-collection bookkeeping (a client's list of
//! vehicles, part stock after a sale, an employee's last login) lives in
//! [`rules`] as ordinary listeners on those channels.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Nothing below `api.rs` prints or exits. Diagnostics go through `tracing`;
//! the binary decides where they end up.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade used by the CLI
//! - [`commands`]: Business logic per workshop area
//! - [`shop`]: Collections, event bus and session wired together
//! - [`rules`]: Listeners that keep collections consistent
//! - [`events`]: Broadcasters and listener handles
//! - [`ledger`]: Expenses split into monthly files
//! - [`store`]: Repositories, persistence service, adapters
//! - [`entity`]: Ids and the `Entity` trait
//! - [`matcher`]: Fuzzy name matching
//! - [`model`]: Workshop records and value types
//! - [`session`]: Who is logged in, password hashing
//! - [`config`]: Per-workshop settings
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod ledger;
pub mod matcher;
pub mod model;
pub mod rules;
pub mod session;
pub mod shop;
pub mod store;
