pub mod default;
pub mod platform_extractor;
pub mod platforms;
pub mod redirect;
pub mod utils;

pub use default::{default_client, no_redirect_client};
pub use platform_extractor::{Extractor, PlatformExtractor};
pub use redirect::resolve_redirect;
