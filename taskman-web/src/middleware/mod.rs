/// Middleware for the web server
///
/// - `security`: security headers on every response
/// - `method_override`: lets HTML forms reach PATCH and DELETE routes

pub mod method_override;
pub mod security;
