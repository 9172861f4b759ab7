pub mod utils_url;

pub use utils_url::{join_path, normalize_base_url, resource_url};
