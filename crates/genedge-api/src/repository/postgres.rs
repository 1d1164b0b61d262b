//! PostgreSQL 사용자 디렉터리 (주 저장소).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use genedge_core::{
    DirectoryError, NewPrincipal, Principal, PrincipalDirectory, PrincipalRecord, Role,
};

// ================================================================================================
// Types
// ================================================================================================

/// `users` 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self) -> PrincipalRecord {
        let role = Role::parse(&self.role).unwrap_or_else(|| {
            tracing::warn!(
                user_id = %self.id,
                role = %self.role,
                "Unknown role in users table, treating as STUDENT"
            );
            Role::Student
        });

        PrincipalRecord {
            principal: Principal {
                id: self.id.to_string(),
                display_name: self.name,
                email: self.email,
                role,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        }
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'STUDENT',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

// ================================================================================================
// Repository
// ================================================================================================

/// PostgreSQL 사용자 디렉터리.
#[derive(Clone)]
pub struct PgPrincipalDirectory {
    pool: PgPool,
}

impl PgPrincipalDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `users` 테이블이 없으면 생성.
    pub async fn ensure_schema(&self) -> Result<(), DirectoryError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl PrincipalDirectory for PgPrincipalDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Principal>, DirectoryError> {
        // UUID가 아닌 ID(메모리 디렉터리 발급)는 이 저장소에 존재할 수 없음
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_record().into_principal()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRow::into_record))
    }

    async fn create(&self, new: NewPrincipal) -> Result<Principal, DirectoryError> {
        let email = new.email.clone();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.display_name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return DirectoryError::Duplicate(email);
                }
            }
            map_sqlx_error(e)
        })?;

        Ok(row.into_record().into_principal())
    }

    async fn list(&self) -> Result<Vec<Principal>, DirectoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|r| r.into_record().into_principal())
            .collect())
    }

    async fn health_check(&self) -> Result<(), DirectoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// sqlx 에러를 디렉터리 에러로 변환.
///
/// 유일성 위반 외의 모든 에러는 저장소 사용 불가로 취급합니다.
fn map_sqlx_error(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Unavailable(err.to_string())
}
