//! PostgreSQL adapters: session ownership, staging and the named cursor.

pub mod cursor;
pub mod numeric;
pub mod session;
pub mod staging;
