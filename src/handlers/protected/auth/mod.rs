pub mod whoami;

pub use whoami::session_whoami;
