//! API response types shared across routes

pub mod response;
