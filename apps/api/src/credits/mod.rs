pub mod handlers;
pub mod ledger;
