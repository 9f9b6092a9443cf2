// handlers/public/auth/mod.rs - Account creation and session acquisition

pub mod register; // POST /auth/register
pub mod session;  // POST /auth/login, POST /auth/logout

pub use register::register_post as user_register;
pub use session::login as session_login;
pub use session::logout as session_logout;
