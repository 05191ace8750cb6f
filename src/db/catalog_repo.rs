// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{CatalogTable, Categoria, Local, Producto, Servicio},
};

// Repositório de leitura do catálogo (produtos, serviços, categorias e
// lojas). As coleções pertencem a outros serviços; a varredura só grava o
// id_contifico de volta.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_local_by_establecimiento(
        &self,
        numero_establecimiento: &str,
    ) -> Result<Option<Local>, AppError> {
        let local = sqlx::query_as::<_, Local>(
            "SELECT * FROM locales WHERE numero_establecimiento = $1 LIMIT 1",
        )
        .bind(numero_establecimiento)
        .fetch_optional(&self.pool)
        .await?;

        Ok(local)
    }

    pub async fn find_producto_by_contifico(
        &self,
        id_contifico: &str,
    ) -> Result<Option<Producto>, AppError> {
        let producto = sqlx::query_as::<_, Producto>(
            "SELECT * FROM productos WHERE id_contifico = $1 LIMIT 1",
        )
        .bind(id_contifico)
        .fetch_optional(&self.pool)
        .await?;

        Ok(producto)
    }

    pub async fn find_servicio_by_contifico(
        &self,
        id_contifico: &str,
    ) -> Result<Option<Servicio>, AppError> {
        let servicio = sqlx::query_as::<_, Servicio>(
            "SELECT * FROM servicios WHERE id_contifico = $1 LIMIT 1",
        )
        .bind(id_contifico)
        .fetch_optional(&self.pool)
        .await?;

        Ok(servicio)
    }

    pub async fn list_productos(&self) -> Result<Vec<Producto>, AppError> {
        let productos =
            sqlx::query_as::<_, Producto>("SELECT * FROM productos ORDER BY nombre ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(productos)
    }

    pub async fn list_servicios(&self) -> Result<Vec<Servicio>, AppError> {
        let servicios =
            sqlx::query_as::<_, Servicio>("SELECT * FROM servicios ORDER BY nombre ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(servicios)
    }

    pub async fn list_categorias_productos(&self) -> Result<Vec<Categoria>, AppError> {
        let categorias = sqlx::query_as::<_, Categoria>(
            "SELECT * FROM categorias_productos ORDER BY nombre ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categorias)
    }

    pub async fn list_categorias_servicios(&self) -> Result<Vec<Categoria>, AppError> {
        let categorias = sqlx::query_as::<_, Categoria>(
            "SELECT * FROM categorias_servicios ORDER BY nombre ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categorias)
    }

    pub async fn get_categoria_producto(
        &self,
        categoria_id: Uuid,
    ) -> Result<Option<Categoria>, AppError> {
        let categoria = sqlx::query_as::<_, Categoria>(
            "SELECT * FROM categorias_productos WHERE id = $1",
        )
        .bind(categoria_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(categoria)
    }

    pub async fn get_categoria_servicio(
        &self,
        categoria_id: Uuid,
    ) -> Result<Option<Categoria>, AppError> {
        let categoria = sqlx::query_as::<_, Categoria>(
            "SELECT * FROM categorias_servicios WHERE id = $1",
        )
        .bind(categoria_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(categoria)
    }

    /// Grava a referência cruzada do Contifico no registro local (o "merge"
    /// da varredura). A tabela vem de um enum fechado, nunca do chamador.
    pub async fn set_id_contifico<'e, E>(
        &self,
        executor: E,
        table: CatalogTable,
        record_id: Uuid,
        id_contifico: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE {} SET id_contifico = $2 WHERE id = $1",
            table.table_name()
        );
        sqlx::query(&sql)
            .bind(record_id)
            .bind(id_contifico)
            .execute(executor)
            .await?;

        Ok(())
    }
}
