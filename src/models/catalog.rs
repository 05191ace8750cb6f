// src/models/catalog.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Catálogo local de produtos e serviços. Propriedade do serviço de catálogo;
// a sincronização só lê e, na varredura, grava o id_contifico de volta.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Producto {
    pub id: Uuid,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub sku: Option<String>,
    pub precio: Decimal,
    pub ref_categoria: Option<Uuid>,
    pub id_contifico: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Servicio {
    pub id: Uuid,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub sku: Option<String>,
    pub precio: Decimal,
    pub ref_categoria: Option<Uuid>,
    pub id_contifico: Option<String>,
}

/// Loja física. O numero_establecimiento casa com o primeiro segmento do
/// número de documento do Contifico.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Local {
    pub id: Uuid,
    pub nombre: String,
    pub numero_establecimiento: String,
}

// Serve para as duas tabelas de categoria (produtos e serviços).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Categoria {
    pub id: Uuid,
    pub nombre: String,
    pub id_contifico: Option<String>,
}

/// Tabelas de catálogo que a varredura pode marcar com id_contifico.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Users,
    CategoriasProductos,
    CategoriasServicios,
    Productos,
    Servicios,
}

impl CatalogTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            CatalogTable::Users => "users",
            CatalogTable::CategoriasProductos => "categorias_productos",
            CatalogTable::CategoriasServicios => "categorias_servicios",
            CatalogTable::Productos => "productos",
            CatalogTable::Servicios => "servicios",
        }
    }
}
