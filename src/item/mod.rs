/// This module provides the address record and its table layout.
pub mod address;

/// This module provides the flat file readers (tokenizer, single and multi-file readers).
pub mod flat;

#[cfg(feature = "rdbc")]
/// This module provides the relational (MySQL, SQLite) item writers.
pub mod rdbc;
