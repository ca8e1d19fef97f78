mod client_repository;
mod user_repository;

pub use client_repository::MemoryClientRepository;
pub use user_repository::MemoryUserRepository;
