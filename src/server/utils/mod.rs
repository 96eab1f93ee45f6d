pub mod header_utils;
pub mod metrics_utils;
pub mod url_utils;
