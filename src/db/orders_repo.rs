// src/db/orders_repo.rs

use sqlx::types::Json;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{FinancialProjection, NewOrder, NewServicioFacturado},
};

// Repositório das projeções locais (orders e servicios_facturados) e do
// contador de número de pedido.
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_order_id_by_contifico(
        &self,
        id_contifico: &str,
    ) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM orders WHERE id_contifico = $1 LIMIT 1",
        )
        .bind(id_contifico)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn find_servicio_id_by_contifico(
        &self,
        id_contifico: &str,
    ) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM servicios_facturados WHERE id_contifico = $1 LIMIT 1",
        )
        .bind(id_contifico)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// Próximo número sequencial de pedido: incremento atômico no contador,
    /// em vez de varrer o máximo existente (que era uma corrida conhecida).
    pub async fn next_order_number(&self) -> Result<i64, AppError> {
        let numero = sqlx::query_scalar::<_, i64>(
            "UPDATE contadores SET valor = valor + 1 WHERE nombre = 'orders' RETURNING valor",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(numero)
    }

    /// Cria o pedido. Os campos de workflow (pickup, custos zerados, notas e
    /// datas nulas) vêm dos DEFAULTs da tabela e nunca mais são tocados pela
    /// sincronização.
    pub async fn insert_order<'e, E>(&self, executor: E, order: &NewOrder) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let p = &order.projection;
        sqlx::query(
            r#"
            INSERT INTO orders
                (id_contifico, order_date, url_ride, order_status, subtotal, tax, total_value,
                 payment_transaction_id, payment_date, payment_methods, client_user_id,
                 products_list, order_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&p.id_contifico)
        .bind(p.order_date)
        .bind(&p.url_ride)
        .bind(p.order_status)
        .bind(p.subtotal)
        .bind(p.tax)
        .bind(p.total_value)
        .bind(&p.payment_transaction_id)
        .bind(p.payment_date)
        .bind(p.payment_methods)
        .bind(p.client_user_id)
        .bind(Json(&order.products_list))
        .bind(order.order_number)
        .execute(executor)
        .await
        .map_err(|e| {
            // Violação do índice único de id_contifico vira um conflito claro.
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "Ya existe una orden para el documento {}",
                        order.projection.id_contifico
                    ));
                }
            }
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// Atualiza só a projeção financeira de um pedido existente.
    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        projection: &FinancialProjection,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE orders SET
                order_date             = $2,
                url_ride               = $3,
                order_status           = $4,
                subtotal               = $5,
                tax                    = $6,
                total_value            = $7,
                payment_transaction_id = $8,
                payment_date           = $9,
                payment_methods        = $10,
                client_user_id         = $11,
                updated_at             = now()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(projection.order_date)
        .bind(&projection.url_ride)
        .bind(projection.order_status)
        .bind(projection.subtotal)
        .bind(projection.tax)
        .bind(projection.total_value)
        .bind(&projection.payment_transaction_id)
        .bind(projection.payment_date)
        .bind(projection.payment_methods)
        .bind(projection.client_user_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_servicio_facturado<'e, E>(
        &self,
        executor: E,
        servicio: &NewServicioFacturado,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let p = &servicio.projection;
        sqlx::query(
            r#"
            INSERT INTO servicios_facturados
                (id_contifico, order_date, url_ride, order_status, subtotal, tax, total_value,
                 payment_transaction_id, payment_date, payment_methods, client_user_id,
                 service_list)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&p.id_contifico)
        .bind(p.order_date)
        .bind(&p.url_ride)
        .bind(p.order_status)
        .bind(p.subtotal)
        .bind(p.tax)
        .bind(p.total_value)
        .bind(&p.payment_transaction_id)
        .bind(p.payment_date)
        .bind(p.payment_methods)
        .bind(p.client_user_id)
        .bind(Json(&servicio.service_list))
        .execute(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!(
                        "Ya existe un servicio facturado para el documento {}",
                        servicio.projection.id_contifico
                    ));
                }
            }
            AppError::Database(e)
        })?;

        Ok(())
    }

    pub async fn update_servicio_facturado<'e, E>(
        &self,
        executor: E,
        servicio_id: Uuid,
        projection: &FinancialProjection,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE servicios_facturados SET
                order_date             = $2,
                url_ride               = $3,
                order_status           = $4,
                subtotal               = $5,
                tax                    = $6,
                total_value            = $7,
                payment_transaction_id = $8,
                payment_date           = $9,
                payment_methods        = $10,
                client_user_id         = $11,
                updated_at             = now()
            WHERE id = $1
            "#,
        )
        .bind(servicio_id)
        .bind(projection.order_date)
        .bind(&projection.url_ride)
        .bind(projection.order_status)
        .bind(projection.subtotal)
        .bind(projection.tax)
        .bind(projection.total_value)
        .bind(&projection.payment_transaction_id)
        .bind(projection.payment_date)
        .bind(projection.payment_methods)
        .bind(projection.client_user_id)
        .execute(executor)
        .await?;

        Ok(())
    }
}
