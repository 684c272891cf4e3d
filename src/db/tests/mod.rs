//! Shared user store test infrastructure
//!
//! The same test logic runs against every `UserRepo` implementation:
//!
//! - **Memory**: the process-local `DashMap` store
//! - **SQLite**: fast in-memory databases with the real migrations
//!
//! # Running tests
//!
//! ```bash
//! cargo test                                   # memory + SQLite (default features)
//! cargo test --no-default-features --features server   # memory only
//! ```
