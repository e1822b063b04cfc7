pub mod driver;
pub mod fetch;
pub mod infra;
pub mod neighbors;
pub mod parser;
pub mod period;
pub mod services;
pub mod slug;
pub mod snapshot;
pub mod store;
