mod common;
mod users;

pub use users::SqliteUserRepo;
