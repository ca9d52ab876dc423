//! Application layer orchestrating the push-payment flow: initiation,
//! callback processing, settlement propagation, and the stale-record sweep.

pub mod callback;
pub mod initiator;
pub mod reconciler;
pub mod settlement;
