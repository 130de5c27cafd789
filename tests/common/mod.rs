#![allow(dead_code)]

pub mod helpers;
pub mod sessions;
pub mod test_app;

pub use helpers::{body_of, button_labels, new_customer, paystack_event};
pub use test_app::{Fixtures, TestApp, TestAppOptions};
