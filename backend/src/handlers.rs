pub mod user_handlers;

pub use user_handlers::{
    create_user, delete_user, get_user, handle_panic, list_users, not_found, update_user,
    SharedUsers,
};
