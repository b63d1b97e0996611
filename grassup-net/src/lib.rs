// grassup-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::{build_http_client, fetch_release_asset, release_asset_url};
pub use validation::validate_url;
