use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32, // assigned by the database
    pub name: String,
    pub email: String, // unique across users
    pub password: String, // Argon2 PHC string, never plaintext
}

/// Values for a new row; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Changes to an existing row. `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}
