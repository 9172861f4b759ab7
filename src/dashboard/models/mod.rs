pub mod paths;

pub use paths::{IntervalQuery, MessagePathsSnapshot};
