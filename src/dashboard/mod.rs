pub mod models;
pub mod poller;
pub mod server;

pub use poller::RefreshPoller;
pub use server::{router, start_dashboard_server, DashboardState};
