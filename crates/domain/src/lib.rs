pub mod entities;
pub mod errors;
pub mod repositories;

pub use entities::{Client, User};
pub use errors::{CrmError, CrmResult};
pub use repositories::{ClientRepository, UserRepository};
