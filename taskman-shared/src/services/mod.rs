//! Use cases
//!
//! Services sit between request handlers and the repository ports. They
//! normalize and validate input, apply authorization rules for the acting
//! user, run the deletion guards and log every mutation.
//!
//! - [`catalog`]: statuses and labels, which share one shape
//! - [`guards`]: refuse deleting rows that tasks depend on
//! - [`tasks`]: task CRUD, label association and filtered listing
//! - [`users`]: registration, sign-in, profile edits and account deletion

pub mod catalog;
pub mod guards;
pub mod tasks;
pub mod users;
