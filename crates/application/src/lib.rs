pub mod clients;
pub mod users;

pub use clients::ClientService;
pub use users::{
    CreateUserCommand, CreateUserHandler, DeleteUserCommand, DeleteUserHandler, GetUserHandler,
    GetUserQuery, ListUsersHandler, ListUsersQuery, UpdateUserCommand, UpdateUserHandler,
};
