// src/db/users_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::users::User};

// Repositório de usuários. Leitura para resolver assessor/cliente por
// cédula; escrita só na varredura (reg_comp_rrss).
#[derive(Clone)]
pub struct UsersRepository {
    pool: PgPool,
}

impl UsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pela cédula (identidade nacional)
    pub async fn find_by_cedula(&self, cedula: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, display_name, cedula, email, telefono, direccion, rol_name, id_contifico, reg_comp_rrss FROM users WHERE cedula = $1 LIMIT 1",
        )
        .bind(cedula)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, display_name, cedula, email, telefono, direccion, rol_name, id_contifico, reg_comp_rrss FROM users ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn set_reg_comp_rrss<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        valor: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET reg_comp_rrss = $2 WHERE id = $1")
            .bind(user_id)
            .bind(valor)
            .execute(executor)
            .await?;

        Ok(())
    }
}
