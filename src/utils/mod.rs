pub mod money;
pub mod string;

pub use money::format_amount;
pub use string::{normalize, safe_preview, truncate_with_ellipsis};
