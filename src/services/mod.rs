pub mod credential;
pub mod email;
pub mod form_schema;
pub mod ledger;
pub mod raffle;
pub mod registration;
pub mod scan;

#[cfg(test)]
pub(crate) mod testutil;
