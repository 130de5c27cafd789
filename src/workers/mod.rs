pub mod payment_expiry;
pub mod session_cleanup;

pub use payment_expiry::payment_expiry_worker;
pub use session_cleanup::session_cleanup_worker;
