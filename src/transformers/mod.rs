pub mod text;
pub mod url;

pub use text::{normalize, tokens};
pub use url::canonicalize;
