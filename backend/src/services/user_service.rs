//! Create, read, update and delete for users, with uniqueness checks on
//! email and phone.
//!
//! The uniqueness check and the write share one transaction but take no
//! lock, so two concurrent creates with the same email can both pass the
//! check. The unique indexes on the table turn the losing insert into a
//! conflict instead of a duplicate row.

use tracing::{debug, info};

use crate::{
    error::{Conflict, ServiceError},
    models::{NewUser, User, UserFields},
    repositories::{UserRepository, UserStore},
};

pub struct UserService<R> {
    repository: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn list(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn get(&self, id: i32) -> Result<User, ServiceError> {
        self.repository.get(id)?.ok_or(ServiceError::NotFound)
    }

    pub fn create(&self, fields: UserFields) -> Result<User, ServiceError> {
        let new_user = into_valid_user(fields)?;

        let user = self
            .repository
            .transaction(|store| -> Result<User, ServiceError> {
                ensure_unique(store, &new_user, None)?;
                Ok(store.insert(&new_user)?)
            })?;

        info!(user_id = user.id, "created user");
        Ok(user)
    }

    /// Replace all four fields of `id`. An unknown id is reported before
    /// any validation error.
    pub fn update(&self, id: i32, fields: UserFields) -> Result<User, ServiceError> {
        let user = self
            .repository
            .transaction(|store| -> Result<User, ServiceError> {
                if store.find(id)?.is_none() {
                    return Err(ServiceError::NotFound);
                }
                let changes = into_valid_user(fields)?;
                ensure_unique(store, &changes, Some(id))?;
                Ok(store.update(id, &changes)?)
            })?;

        info!(user_id = user.id, "updated user");
        Ok(user)
    }

    pub fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.repository
            .transaction(|store| -> Result<(), ServiceError> {
                if store.find(id)?.is_none() {
                    return Err(ServiceError::NotFound);
                }
                Ok(store.delete(id)?)
            })?;

        info!(user_id = id, "deleted user");
        Ok(())
    }
}

fn into_valid_user(fields: UserFields) -> Result<NewUser, ServiceError> {
    fields.into_new_user().map_err(|errors| {
        debug!(fields = ?errors.keys().collect::<Vec<_>>(), "rejected invalid user");
        ServiceError::Validation(errors)
    })
}

/// Email is checked before phone and only the first collision is reported.
fn ensure_unique(
    store: &mut dyn UserStore,
    user: &NewUser,
    excluding: Option<i32>,
) -> Result<(), ServiceError> {
    if store.find_by_email(&user.email, excluding)?.is_some() {
        debug!(email = %user.email, "email already taken");
        return Err(Conflict::Email.into());
    }
    if store.find_by_phone(&user.phone, excluding)?.is_some() {
        debug!(phone = %user.phone, "phone already taken");
        return Err(Conflict::Phone.into());
    }
    Ok(())
}
