// handlers/public/mod.rs - Public handlers (no session required)

pub mod auth;
