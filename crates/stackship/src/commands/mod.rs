pub mod check;
pub mod cleanup;
pub mod logs;
pub mod monitor;
pub mod packages;
pub mod serve;
pub mod setup;
