//! Persistence port for users and its diesel/SQLite adapter.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::{Sqlite, SqliteConnection};
use thiserror::Error;
use tracing::debug;

use crate::{
    db::DbPool,
    error::Conflict,
    models::{NewUser, User},
    schema::users,
};

/// Failures surfaced by a [`UserRepository`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No connection could be checked out of the pool.
    #[error("Database connection error: {message}")]
    Connection { message: String },
    /// The storage layer rejected a row because of a unique index.
    #[error(transparent)]
    Duplicate(Conflict),
    #[error("{message}")]
    Query { message: String },
}

/// Row-level operations available inside a repository transaction.
pub trait UserStore {
    fn find(&mut self, id: i32) -> Result<Option<User>, RepositoryError>;

    /// First user with this email, ignoring the row `excluding` if given.
    fn find_by_email(
        &mut self,
        email: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, RepositoryError>;

    /// First user with this phone, ignoring the row `excluding` if given.
    fn find_by_phone(
        &mut self,
        phone: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, RepositoryError>;

    fn insert(&mut self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Replace all four business fields of `id`.
    fn update(&mut self, id: i32, user: &NewUser) -> Result<User, RepositoryError>;

    fn delete(&mut self, id: i32) -> Result<(), RepositoryError>;
}

/// Storage handle injected into [`crate::services::UserService`].
pub trait UserRepository: Send + Sync + 'static {
    /// All users in ascending id order.
    fn list(&self) -> Result<Vec<User>, RepositoryError>;

    fn get(&self, id: i32) -> Result<Option<User>, RepositoryError>;

    /// Run `f` inside one transaction. Commits when `f` returns `Ok` and
    /// rolls back on every other exit.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UserStore) -> Result<T, E>,
        E: From<RepositoryError>;
}

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, RepositoryError> {
        self.pool.get().map_err(|e| RepositoryError::Connection {
            message: e.to_string(),
        })
    }
}

impl UserRepository for DieselUserRepository {
    fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let mut pooled = self.connection()?;
        let conn: &mut SqliteConnection = &mut pooled;
        users::table
            .select(User::as_select())
            .order(users::id.asc())
            .load(conn)
            .map_err(map_diesel_error)
    }

    fn get(&self, id: i32) -> Result<Option<User>, RepositoryError> {
        let mut pooled = self.connection()?;
        DieselUserStore { conn: &mut pooled }.find(id)
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UserStore) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut pooled = self.connection()?;
        let conn: &mut SqliteConnection = &mut pooled;

        // Writers take the lock at BEGIN so they wait on busy_timeout. A
        // deferred BEGIN fails the shared-to-write upgrade with SQLITE_BUSY.
        conn.immediate_transaction(|conn| {
            f(&mut DieselUserStore { conn }).map_err(TransactionError::Aborted)
        })
        .map_err(|error| match error {
            TransactionError::Aborted(error) => error,
            TransactionError::Diesel(error) => E::from(map_diesel_error(error)),
        })
    }
}

/// Keeps the caller's error apart from diesel's own begin/commit failures.
enum TransactionError<E> {
    Aborted(E),
    Diesel(DieselError),
}

impl<E> From<DieselError> for TransactionError<E> {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

struct DieselUserStore<'a> {
    conn: &'a mut SqliteConnection,
}

impl UserStore for DieselUserStore<'_> {
    fn find(&mut self, id: i32) -> Result<Option<User>, RepositoryError> {
        users::table
            .find(id)
            .select(User::as_select())
            .first(self.conn)
            .optional()
            .map_err(map_diesel_error)
    }

    fn find_by_email(
        &mut self,
        email: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, RepositoryError> {
        let mut query = users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .into_boxed::<Sqlite>();
        if let Some(id) = excluding {
            query = query.filter(users::id.ne(id));
        }

        query.first(self.conn).optional().map_err(map_diesel_error)
    }

    fn find_by_phone(
        &mut self,
        phone: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, RepositoryError> {
        let mut query = users::table
            .filter(users::phone.eq(phone))
            .select(User::as_select())
            .into_boxed::<Sqlite>();
        if let Some(id) = excluding {
            query = query.filter(users::id.ne(id));
        }

        query.first(self.conn).optional().map_err(map_diesel_error)
    }

    fn insert(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        diesel::insert_into(users::table)
            .values(user)
            .returning(User::as_returning())
            .get_result(self.conn)
            .map_err(map_diesel_error)
    }

    fn update(&mut self, id: i32, user: &NewUser) -> Result<User, RepositoryError> {
        diesel::update(users::table.find(id))
            .set(user)
            .returning(User::as_returning())
            .get_result(self.conn)
            .map_err(map_diesel_error)
    }

    fn delete(&mut self, id: i32) -> Result<(), RepositoryError> {
        diesel::delete(users::table.find(id))
            .execute(self.conn)
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

fn map_diesel_error(error: DieselError) -> RepositoryError {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &error {
        debug!(message = info.message(), "unique index rejected user row");
        if info.message().contains("users.email") {
            return RepositoryError::Duplicate(Conflict::Email);
        }
        if info.message().contains("users.phone") {
            return RepositoryError::Duplicate(Conflict::Phone);
        }
    }

    RepositoryError::Query {
        message: error.to_string(),
    }
}
