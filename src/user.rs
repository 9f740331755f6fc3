//! Defines the user model, the user store trait and its SQLite implementation.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error, PasswordHash,
    db::{CreateTable, MapRow, lock},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email the user logs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// Extra roles stored with the user as a JSON array. New users have none.
    pub roles: Vec<String>,
}

/// Handles the creation, retrieval and deletion of users.
pub trait UserStore {
    /// Create a new user with no extra roles.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if `email` is already registered.
    fn create(&self, email: EmailAddress, password_hash: PasswordHash) -> Result<User, Error>;

    /// Get a user by their ID.
    ///
    /// Returns [Error::NotFound] if no user has the ID.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Delete a user and, through the foreign key cascade, all of their expenses.
    ///
    /// Returns [Error::DeleteMissingUser] if no user has the ID.
    fn delete(&self, id: UserID) -> Result<(), Error>;
}

/// A user store backed by the application's SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Get the user that owns `email`, or `None` if the email is not registered.
    pub fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, Error> {
        lock(&self.connection)?
            .prepare("SELECT id, email, password, roles FROM user WHERE email = :email")?
            .query_row(&[(":email", email.as_str())], SQLiteUserStore::map_row)
            .optional()
            .map_err(|error| error.into())
    }
}

impl UserStore for SQLiteUserStore {
    fn create(&self, email: EmailAddress, password_hash: PasswordHash) -> Result<User, Error> {
        let connection = lock(&self.connection)?;

        connection.execute(
            "INSERT INTO user (email, password, roles) VALUES (?1, ?2, '[]')",
            (email.as_str(), password_hash.as_ref()),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User {
            id,
            email,
            password_hash,
            roles: Vec::new(),
        })
    }

    fn get(&self, id: UserID) -> Result<User, Error> {
        lock(&self.connection)?
            .prepare("SELECT id, email, password, roles FROM user WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], SQLiteUserStore::map_row)
            .map_err(|error| error.into())
    }

    fn delete(&self, id: UserID) -> Result<(), Error> {
        let rows_affected = lock(&self.connection)?
            .execute("DELETE FROM user WHERE id = ?1", [id.as_i64()])?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingUser);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY,
                    email TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL,
                    roles TEXT NOT NULL DEFAULT '[]'
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let raw_email: String = row.get(offset + 1)?;
        let raw_password_hash: String = row.get(offset + 2)?;
        let raw_roles: String = row.get(offset + 3)?;

        let roles = serde_json::from_str(&raw_roles).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 3,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        Ok(User {
            id: UserID::new(raw_id),
            email: EmailAddress::new_unchecked(raw_email),
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            roles,
        })
    }
}

#[cfg(test)]
mod user_store_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{Error, PasswordHash, db::initialize};

    use super::{SQLiteUserStore, UserID, UserStore};

    fn get_store() -> SQLiteUserStore {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        SQLiteUserStore::new(Arc::new(Mutex::new(connection)))
    }

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::from_str(raw).unwrap()
    }

    #[test]
    fn create_user_succeeds() {
        let store = get_store();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let user = store
            .create(email("hello@world.com"), password_hash.clone())
            .unwrap();

        assert!(user.id.as_i64() > 0);
        assert_eq!(user.email, email("hello@world.com"));
        assert_eq!(user.password_hash, password_hash);
    }

    #[test]
    fn create_user_fails_on_duplicate_email() {
        let store = get_store();
        store
            .create(email("hello@world.com"), PasswordHash::new_unchecked("hunter2"))
            .unwrap();

        let result = store.create(email("hello@world.com"), PasswordHash::new_unchecked("hunter3"));

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let store = get_store();

        assert_eq!(store.get(UserID::new(42)), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let store = get_store();
        let user = store
            .create(email("foo@bar.baz"), PasswordHash::new_unchecked("hunter2"))
            .unwrap();

        let got = store.find_by_email(&email("foo@bar.baz")).unwrap();

        assert_eq!(got, Some(user));
    }

    #[test]
    fn get_user_fails_with_unknown_email() {
        let store = get_store();

        assert_eq!(store.find_by_email(&email("nobody@bar.baz")), Ok(None));
    }

    #[test]
    fn new_user_is_stored_without_roles() {
        let store = get_store();
        let user = store
            .create(email("foo@bar.baz"), PasswordHash::new_unchecked("hunter2"))
            .unwrap();

        let got = store.get(user.id).unwrap();

        assert!(got.roles.is_empty());
    }

    #[test]
    fn delete_user_succeeds() {
        let store = get_store();
        let user = store
            .create(email("foo@bar.baz"), PasswordHash::new_unchecked("hunter2"))
            .unwrap();

        store.delete(user.id).unwrap();

        assert_eq!(store.get(user.id), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_user_fails() {
        let store = get_store();

        assert_eq!(store.delete(UserID::new(42)), Err(Error::DeleteMissingUser));
    }
}
