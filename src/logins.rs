//! Local login store for the IoT app.
//!
//! Passwords are stored as `sha256$<hex digest>`. The store only maps an
//! email and password to the InfluxDB read and write tokens saved at signup.

use migration::{Migrator, SEED_DEFAULT_USER};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use sha2::{Digest, Sha256};

use crate::entity::user;

const HASH_PREFIX: &str = "sha256$";

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("No account is registered for that email")]
    UnknownEmail,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(#[from] hex::FromHexError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Hash a plaintext password into the stored `sha256$<hex>` form.
#[must_use]
pub fn hash_password(plain: &str) -> String {
    let digest = Sha256::digest(plain.as_bytes());
    format!("{HASH_PREFIX}{}", hex::encode(digest))
}

/// Check `plain` against a stored hash. The `sha256$` prefix is optional.
///
/// # Errors
///
/// Returns `LoginError::MalformedHash` if the stored digest is not valid hex.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, LoginError> {
    let stored = stored.strip_prefix(HASH_PREFIX).unwrap_or(stored);
    let expected = hex::decode(stored)?;
    let actual = Sha256::digest(plain.as_bytes());
    Ok(actual.as_slice() == expected.as_slice())
}

/// Connect to the login database and bring its schema up to date.
///
/// # Errors
///
/// Returns `DbErr` if the connection or a migration fails.
pub async fn open_login_db(
    options: impl Into<ConnectOptions>,
) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    prepare_login_db(&db).await?;
    Ok(db)
}

/// Run pending migrations on an open login database.
///
/// The first run creates the `user` table with a default account that can log
/// in but holds placeholder tokens. A database that already has the table and
/// the default account is left as it is.
///
/// # Errors
///
/// Returns `DbErr` if a migration fails.
pub async fn prepare_login_db(db: &DatabaseConnection) -> Result<(), DbErr> {
    let seeding = Migrator::get_pending_migrations(db)
        .await?
        .iter()
        .any(|m| m.name() == SEED_DEFAULT_USER);

    Migrator::up(db, None).await?;

    if seeding {
        tracing::info!(
            email = "mickey@example.com",
            password = "pass",
            "Default login available; this account cannot access your InfluxDB organization"
        );
    }

    Ok(())
}

/// Look up `email` and check `password` against its stored hash.
///
/// # Errors
///
/// Returns `LoginError::UnknownEmail` or `LoginError::IncorrectPassword` for
/// rejected credentials, and the underlying error otherwise.
pub async fn try_login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model, LoginError> {
    let account = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
        .ok_or(LoginError::UnknownEmail)?;

    if !verify_password(password, &account.password)? {
        return Err(LoginError::IncorrectPassword);
    }

    Ok(account)
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub read_token: String,
    pub write_token: String,
}

/// Register a new account.
///
/// # Errors
///
/// Returns `DbErr` if the insert fails, e.g. when the email is already taken.
pub async fn register_user(
    db: &DatabaseConnection,
    new_user: NewUser,
) -> Result<user::Model, DbErr> {
    let account = user::ActiveModel {
        email: Set(new_user.email),
        name: Set(new_user.name),
        password: Set(hash_password(&new_user.password)),
        read_token: Set(new_user.read_token),
        write_token: Set(new_user.write_token),
        ..Default::default()
    };

    let account = account.insert(db).await?;
    tracing::info!(id = account.id, email = %account.email, "Registered user");
    Ok(account)
}
