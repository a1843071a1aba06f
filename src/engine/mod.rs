//! The economy engine: cost routing, propagation, the ledger, campaign
//! lifecycle, capture transactions, and roster mutations.

pub mod capture;
pub mod ledger;
pub mod lifecycle;
pub mod mutations;
pub mod propagation;
pub mod router;
