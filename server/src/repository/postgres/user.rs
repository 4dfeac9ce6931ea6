use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{NewUser, Profile, ProfileChanges, User, UserCredentials};
use crate::repository::UserRepository;
use crate::utils::{AppError, AppResult};

const PROFILE_SELECT: &str = r#"
    SELECT p.id, p.user_id, u.username, u.email,
           p.full_name, p.bio, p.location, p.profile_picture
    FROM profiles p
    INNER JOIN users u ON u.id = p.user_id
"#;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, first_name, last_name, date_joined
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profiles (id, user_id) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(created.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, first_name, last_name, date_joined
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!("{PROFILE_SELECT} WHERE p.user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self, changes))]
    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> AppResult<Profile> {
        let res = sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                bio = COALESCE($3, bio),
                location = COALESCE($4, location),
                profile_picture = COALESCE($5, profile_picture)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(changes.full_name)
        .bind(changes.bio)
        .bind(changes.location)
        .bind(changes.profile_picture)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() < 1 {
            return Err(AppError::NotFound("Profile not found.".to_string()));
        }

        self.find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found.".to_string()))
    }
}
