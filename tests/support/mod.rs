#![allow(dead_code)]

pub mod home_env;
pub mod shipments;
