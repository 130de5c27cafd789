pub mod health;
pub mod orders;
pub mod payments;
pub mod whatsapp;

pub use health::*;
pub use orders::*;
pub use payments::*;
pub use whatsapp::*;
