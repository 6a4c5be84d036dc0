//! GreenDAO dashboard core: eco-scored market board, simulated governance,
//! GREEN token ledger and advisor, all reachable through [`dashboard::Dashboard`].

pub mod advisor;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod eco;
pub mod governance;
pub mod green_token;
pub mod journal;
pub mod logger;
pub mod market;
pub mod notifier;
pub mod okx;
pub mod scanner;
pub mod strategy;
pub mod time;
pub mod wallet;

pub use dashboard::Dashboard;
