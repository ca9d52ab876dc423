//! Mobile-money push-payment core: initiation against the rail, asynchronous
//! callback reconciliation, and settlement propagation onto linked invoices.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
