#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScannerError`)
//! - [`config`]: Scanner configuration (`ScannerConfig`)
//! - [`types`]: Domain types (`RepositoryTarget`, `PackageRef`, `NormalizedVersion`, `Finding`)
//! - [`parser`]: Manifest parsers (`ManifestParser` trait, `ParserRegistry`, `NpmLockParser`, `ComposerLockParser`)
//! - [`fetcher`]: Manifest retrieval (`ManifestFetcher` trait, `GithubFetcher`)
//! - [`osv`]: Vulnerability lookup (`VulnerabilityLookup` trait, `OsvClient`, `RetryingLookup`)
//! - [`ledger`]: Dedup ledger (`DedupLedger`, `LedgerStore`, `JsonFileStore`, `MemoryStore`)
//! - [`notifier`]: Notification delivery (`Notifier`, `DiscordNotifier`, `MessageFormatter`, `NotifyingSink`)
//! - [`scanner`]: Cycle orchestrator (`ScanOrchestrator`, `ScanOrchestratorBuilder`, `CycleReport`)
//! - [`service`]: Single-flight periodic runner (`ScanService`)
//!
//! # Architecture
//!
//! ```text
//! repositories.json --> ScanService (single-flight, interval)
//!                            |
//!                      ScanOrchestrator
//!                            |
//!   GithubFetcher --> ParserRegistry --> RetryingLookup<OsvClient>
//!                                              |
//!                                   DedupLedger (should_notify)
//!                                              |
//!                          NotifyingSink<DiscordNotifier> --> record_notified
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod ledger;
pub mod notifier;
pub mod osv;
pub mod parser;
pub mod scanner;
pub mod service;
pub mod types;

// --- Public API Re-exports ---

// Orchestrator
pub use scanner::{
    Clock, CycleReport, FailureScope, FindingSink, ScanOrchestrator, ScanOrchestratorBuilder,
    SystemClock, UnitFailure,
};
pub use service::{ScanService, load_repositories};

// Configuration
pub use config::ScannerConfig;

// Error
pub use error::ScannerError;

// Types
pub use types::{
    Advisory, Ecosystem, Finding, NormalizedVersion, PackageRef, Reference, RepositoryList,
    RepositoryTarget,
};

// Parser
pub use parser::composer::ComposerLockParser;
pub use parser::npm::NpmLockParser;
pub use parser::{ManifestParser, ParserRegistry};

// Collaborators
pub use fetcher::{GithubFetcher, ManifestFetcher};
pub use notifier::{DiscordNotifier, MessageFormatter, Notifier, NotifyingSink};
pub use osv::{OsvClient, RetryConfig, RetryingLookup, VulnerabilityLookup};

// Ledger
pub use ledger::{DedupLedger, JsonFileStore, LedgerStore, MemoryStore};
