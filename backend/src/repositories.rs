pub mod user_repository;

pub use user_repository::{DieselUserRepository, RepositoryError, UserRepository, UserStore};
