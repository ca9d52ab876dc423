//! Domain types: the payment ledger record, its status machine, payer phone
//! numbers, and the ports the application layer drives.

pub mod payment;
pub mod phone;
pub mod ports;
