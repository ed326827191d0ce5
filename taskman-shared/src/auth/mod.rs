/// Authentication primitives
///
/// - [`password`]: Argon2id hashing and verification of account passwords
/// - [`session`]: HS256 session tokens carried in the session cookie
///
/// Authorization rules (who may edit or delete what) live with the use
/// cases in [`crate::services`].

pub mod password;
pub mod session;
