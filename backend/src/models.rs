pub mod user_models;

pub use user_models::{NewUser, User, UserFields};
