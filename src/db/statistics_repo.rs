// src/db/statistics_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::statistics::{MonthlyStatistic, StatDeltas, StatDimension},
};

// Repositório dos baldes de estatística mensal.
#[derive(Clone)]
pub struct StatisticsRepository {
    pool: PgPool,
}

impl StatisticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca o balde pelo período e pela dimensão (match exato nos sete
    /// campos da chave; IS NOT DISTINCT FROM cobre os nulos).
    pub async fn find_by_dimension(
        &self,
        year: i32,
        month: i32,
        dimension: &StatDimension,
    ) -> Result<Option<MonthlyStatistic>, AppError> {
        let (store_ref, asesor_ref, client_ref, product_ref, service_ref) = dimension.refs();

        let bucket = sqlx::query_as::<_, MonthlyStatistic>(
            r#"
            SELECT * FROM monthly_statistics
            WHERE year = $1
              AND month = $2
              AND store_ref   IS NOT DISTINCT FROM $3
              AND asesor_ref  IS NOT DISTINCT FROM $4
              AND client_ref  IS NOT DISTINCT FROM $5
              AND product_ref IS NOT DISTINCT FROM $6
              AND service_ref IS NOT DISTINCT FROM $7
            LIMIT 1
            "#,
        )
        .bind(year)
        .bind(month)
        .bind(store_ref)
        .bind(asesor_ref)
        .bind(client_ref)
        .bind(product_ref)
        .bind(service_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bucket)
    }

    /// Insere um balde recém-criado (contadores zerados).
    pub async fn insert_bucket<'e, E>(
        &self,
        executor: E,
        bucket: &MonthlyStatistic,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO monthly_statistics
                (id, year, month, store_ref, asesor_ref, client_ref, product_ref, service_ref,
                 product_total_value, service_total_value, product_count, service_count,
                 total_value, total_transactions, last_update)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(bucket.id)
        .bind(bucket.year)
        .bind(bucket.month)
        .bind(bucket.store_ref)
        .bind(bucket.asesor_ref)
        .bind(bucket.client_ref)
        .bind(bucket.product_ref)
        .bind(bucket.service_ref)
        .bind(bucket.product_total_value)
        .bind(bucket.service_total_value)
        .bind(bucket.product_count)
        .bind(bucket.service_count)
        .bind(bucket.total_value)
        .bind(bucket.total_transactions)
        .bind(bucket.last_update)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Incremento aditivo, protegido pelo token da execução: reaplicar a
    /// mesma execução (retry após falha parcial) não conta duas vezes.
    pub async fn increment_bucket<'e, E>(
        &self,
        executor: E,
        bucket_id: Uuid,
        deltas: &StatDeltas,
        run_token: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE monthly_statistics SET
                product_total_value = product_total_value + $2,
                service_total_value = service_total_value + $3,
                product_count       = product_count + $4,
                service_count       = service_count + $5,
                total_value         = total_value + $6,
                total_transactions  = total_transactions + $7,
                last_update         = $8,
                last_run_token      = $9
            WHERE id = $1
              AND last_run_token IS DISTINCT FROM $9
            "#,
        )
        .bind(bucket_id)
        .bind(deltas.product_total_value)
        .bind(deltas.service_total_value)
        .bind(deltas.product_count)
        .bind(deltas.service_count)
        .bind(deltas.total_value)
        .bind(deltas.total_transactions)
        .bind(at)
        .bind(run_token)
        .execute(executor)
        .await?;

        Ok(())
    }
}
