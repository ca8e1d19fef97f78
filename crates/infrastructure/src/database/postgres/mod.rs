mod client_repository;
mod user_repository;

pub use client_repository::PostgresClientRepository;
pub use user_repository::PostgresUserRepository;
