// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every route in this tier sits behind `session_auth_middleware`, so handlers
// can rely on an `AuthUser` extension being present.

pub mod auth;  // Session introspection
pub mod items; // Per-owner item CRUD
