#[cfg(test)]
pub mod offer_store_tests;
#[cfg(test)]
pub mod router_tests;
#[cfg(test)]
pub mod utils;
