pub mod algo;
pub mod error;
pub mod global_router;
pub mod grid;
pub mod single_net_router;

pub use error::RouteError;
pub use global_router::{route_all_nets, route_all_nets_parallel};
