//! Request middleware.

pub mod real_ip;
pub mod unpanic;
