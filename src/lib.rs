pub mod abi;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod notice;
pub mod sync;
pub mod units;
pub mod utils;
pub mod wallet;
