//! Concrete adapters behind the domain ports: the in-memory ledger and the
//! rail's HTTP client.

pub mod daraja;
pub mod in_memory;
