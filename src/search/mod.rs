pub mod exchange;
pub mod local_search;
pub mod node;
pub mod route;
pub mod time_window_segment;
pub mod working_solution;

pub use exchange::{
    Exchange, Exchange10, Exchange11, Exchange20, Exchange21, Exchange22, Exchange30, Exchange33,
};
pub use local_search::{LocalSearch, SearchOperator};
pub use node::{Node, NodeIdx};
pub use route::{Route, RouteIdx};
pub use time_window_segment::TimeWindowSegment;
pub use working_solution::WorkingSolution;
