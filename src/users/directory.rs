use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{ChatError, ChatResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    /// Base64 bitmap, empty until the user picks one.
    pub avatar_image: String,
    pub is_avatar_image_set: bool,
}

/// How a user looks in someone else's contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar_image: String,
}

impl From<User> for Contact {
    fn from(User { id, username, email, avatar_image, .. }: User) -> Self {
        Self { id, username, email, avatar_image }
    }
}

#[derive(FromRow)]
struct Credentials {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: &str) -> ChatResult<User>;
}

#[derive(Clone)]
pub struct Directory {
    db_pool: SqlitePool,
}

const USER_COLUMNS: &str = "id,username,email,avatar_image,is_avatar_image_set";

impl Directory {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> ChatResult<User> {
        let id = Uuid::now_v7().to_string();

        sqlx::query("INSERT INTO users (id,username,email,password_hash) VALUES (?,?,?,?)")
            .bind(&id)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .execute(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    ChatError::invalid("Username or email already used")
                }
                e => e.into(),
            })?;

        Ok(User {
            id,
            username: username.to_owned(),
            email: email.to_owned(),
            avatar_image: String::new(),
            is_avatar_image_set: false,
        })
    }

    pub async fn username_taken(&self, username: &str) -> ChatResult<bool> {
        Ok(sqlx::query("SELECT 1 FROM users WHERE username=?")
            .bind(username)
            .fetch_optional(&self.db_pool)
            .await?
            .is_some())
    }

    pub async fn email_taken(&self, email: &str) -> ChatResult<bool> {
        Ok(sqlx::query("SELECT 1 FROM users WHERE email=?")
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?
            .is_some())
    }

    /// The user registered under `username` together with its password hash.
    pub async fn credentials(&self, username: &str) -> ChatResult<Option<(User, String)>> {
        let credentials: Option<Credentials> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS},password_hash FROM users WHERE username=?"))
                .bind(username)
                .fetch_optional(&self.db_pool)
                .await?;

        Ok(credentials.map(|c| (c.user, c.password_hash)))
    }

    pub async fn set_avatar(&self, id: &str, image: &str) -> ChatResult<User> {
        let updated = sqlx::query("UPDATE users SET avatar_image=?, is_avatar_image_set=1 WHERE id=?")
            .bind(image)
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(ChatError::NotFound(format!("user {id}")));
        }

        self.get_user(id).await
    }

    /// Everyone except `id`, in registration order.
    pub async fn contacts(&self, id: &str) -> ChatResult<Vec<Contact>> {
        let users: Vec<User> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id<>? ORDER BY rowid"))
                .bind(id)
                .fetch_all(&self.db_pool)
                .await?;

        Ok(users.into_iter().map(Contact::from).collect())
    }
}

#[async_trait]
impl UserDirectory for Directory {
    async fn get_user(&self, id: &str) -> ChatResult<User> {
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id=?"))
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("user {id}")))
    }
}
