#![allow(dead_code)]

pub mod fake_commons;
pub mod socket_guard;
