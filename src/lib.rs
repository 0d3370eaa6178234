//! custodian: exchange deposit/withdrawal custody service.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────────┐
//!                 │                    CUSTODIAN                        │
//!                 │                                                     │
//!   API Client    │  ┌─────────┐                    ┌───────────────┐  │
//!   ──────────────┼─▶│   api   │───────────────────▶│ engine::wallet│  │
//!                 │  └─────────┘                    │ (issue/balance)│  │
//!                 │       │                         └───────┬───────┘  │
//!                 │       ▼                                 │          │
//!                 │  ┌──────────────────┐          ┌────────▼──────┐  │
//!                 │  │engine::withdrawal│          │     store     │  │
//!                 │  │  (batch drain)   │◀────────▶│  (contract)   │  │
//!                 │  └────────┬─────────┘          └────────▲──────┘  │
//!                 │           │                             │          │
//!                 │  ┌────────▼─────────┐          ┌────────┴──────┐  │
//!                 │  │     custody      │          │engine::deposit│  │
//!                 │  │  (AEAD keys)     │          │ (chain scans) │  │
//!                 │  └──────────────────┘          └────────┬──────┘  │
//!                 │                                         │          │
//!                 │  ┌────────────────────────────────────  ▼  ─────┐ │
//!                 │  │            adapter (per-chain contract)      │ │
//!                 │  └──────────────────────────────────────────────┘ │
//!                 └────────────────────────────────────────┬──────────┘
//!                                                          │
//!                                                   Chain RPC nodes
//! ```

pub mod adapter;
pub mod api;
pub mod config;
pub mod custody;
pub mod engine;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod store;

pub use config::CustodianConfig;
pub use custody::KeyCustody;
pub use lifecycle::Shutdown;
