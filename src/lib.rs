/// Account variants and their balance rules.
/// Operations are validated into events first, then applied.
pub mod account;

/// Operations parsed from caller input, later executed by [`processor`].
pub mod command;

/// Fee schedule and ledger settings.
pub mod config;

pub mod clock;

/// Premium membership state and the fee/interest waivers it grants.
pub mod premium;

/// Append-only log of balance-affecting operations.
pub mod recorder;

/// Two-legged transfers between accounts.
pub mod transfer;

/// Ledger snapshot persistence, plus in-memory and file-backed stores.
pub mod store;

/// Transaction processor interface, plus the per-user session implementation.
/// Coordinates accounts, premium policy, persistence and the transaction log.
pub mod processor;

/// Bootstraps the library for the batch binary. Lives here so the
/// integration tests can drive it too.
pub mod bin_utils;
