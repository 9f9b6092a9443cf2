// handlers/mod.rs - HTTP handlers grouped by security tier
//
// public:    no session required (/auth/*)
// protected: session middleware applied (/api/*)

pub mod protected;
pub mod public;
