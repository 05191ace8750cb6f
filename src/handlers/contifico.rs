// src/handlers/contifico.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::contifico::{DocumentoElectronicoPayload, MovInvDetalle},
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "El campo 'category' es obligatorio."))]
    pub category: String,
    #[validate(length(min = 1, message = "El campo 'tipo' es obligatorio."))]
    pub tipo: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProdServPayload {
    #[validate(length(min = 1, message = "El campo 'tipo' es obligatorio."))]
    pub tipo: String,
    #[validate(length(min = 1, message = "El campo 'nombre' es obligatorio."))]
    pub nombre: String,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub precio: Decimal,
    pub compra: Option<Decimal>,
    pub stock: Option<Decimal>,
    pub sku: Option<String>,
    #[serde(default)]
    pub estado: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovInvPayload {
    #[validate(length(min = 1, message = "El campo 'tipo' es obligatorio."))]
    pub tipo: String,
    #[validate(length(min = 1, message = "El movimiento necesita al menos un detalle."))]
    pub product_details: Vec<MovInvDetalle>,
    pub descripcion: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "El campo 'cedula' es obligatorio."))]
    pub cedula: String,
    #[validate(length(min = 1, message = "El campo 'razonSocial' es obligatorio."))]
    pub razon_social: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    #[serde(default)]
    pub es_cliente: bool,
    #[serde(default)]
    pub es_empleado: bool,
    #[serde(default)]
    pub es_vendedor: bool,
}

// ---
// Handlers
// ---

// GET /contifico/documentos — gatilho (manual ou do scheduler) da
// sincronização diária.
#[utoipa::path(
    get,
    path = "/contifico/documentos",
    tag = "Contifico",
    responses(
        (status = 200, description = "Documentos do dia sincronizados"),
        (status = 500, description = "Falha na API do Contifico ou no banco")
    )
)]
pub async fn obtener_documentos(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Recibida solicitud para obtener los documentos de Contifico.");
    let message = app_state.sync_service.sincronizar_documentos().await?;
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}

// GET /contifico/barrido — varredura dos cadastros locais sem id_contifico.
#[utoipa::path(
    get,
    path = "/contifico/barrido",
    tag = "Contifico",
    responses(
        (status = 200, description = "Cadastros locais completados no Contifico")
    )
)]
pub async fn barrido_catalogo(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Recibida solicitud para el barrido de cadastros hacia Contifico.");
    let message = app_state.sync_service.sincronizar_catalogo().await?;
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}

// POST /contifico/createCategory
#[utoipa::path(
    post,
    path = "/contifico/createCategory",
    tag = "Contifico",
    request_body = CreateCategoryPayload,
    responses(
        (status = 200, description = "Categoria criada; message traz o id do Contifico"),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Recibida solicitud para crear la categoría en Contifico.");
    payload.validate()?;

    let message = app_state
        .contifico_service
        .create_category(&payload.category, &payload.tipo)
        .await?;
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}

// POST /contifico/createProdServ
#[utoipa::path(
    post,
    path = "/contifico/createProdServ",
    tag = "Contifico",
    request_body = CreateProdServPayload,
    responses(
        (status = 200, description = "Produto/serviço criado; message traz o id do Contifico"),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn create_prod_serv(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateProdServPayload>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Recibida solicitud para crear el producto/servicio en Contifico.");
    payload.validate()?;

    let message = app_state
        .contifico_service
        .create_product_or_service(
            &payload.tipo,
            &payload.nombre,
            payload.descripcion.as_deref(),
            payload.categoria.as_deref(),
            payload.precio,
            payload.compra,
            payload.stock,
            payload.sku.as_deref(),
            payload.estado,
        )
        .await?;
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}

// POST /contifico/createMovInv
#[utoipa::path(
    post,
    path = "/contifico/createMovInv",
    tag = "Contifico",
    request_body = CreateMovInvPayload,
    responses(
        (status = 200, description = "Movimento de inventário registrado"),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn create_mov_inv(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateMovInvPayload>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Recibida solicitud para crear el movimiento de inventario en Contifico.");
    payload.validate()?;

    app_state
        .contifico_service
        .create_inventory_movement(
            &payload.tipo,
            &payload.product_details,
            payload.descripcion.as_deref(),
        )
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Movimiento de inventario registrado correctamente" })),
    ))
}

// POST /contifico/createUser
#[utoipa::path(
    post,
    path = "/contifico/createUser",
    tag = "Contifico",
    request_body = CreateUserPayload,
    responses(
        (status = 200, description = "Pessoa criada; message traz o id do Contifico"),
        (status = 400, description = "Payload inválido")
    )
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Recibida solicitud para crear el usuario dentro de Contifico.");
    payload.validate()?;

    let message = app_state
        .contifico_service
        .create_client(
            &payload.cedula,
            &payload.razon_social,
            payload.telefono.as_deref(),
            payload.email.as_deref(),
            payload.direccion.as_deref(),
            payload.es_cliente,
            payload.es_empleado,
            payload.es_vendedor,
        )
        .await?;
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}

// POST /contifico/createDoc
#[utoipa::path(
    post,
    path = "/contifico/createDoc",
    tag = "Contifico",
    request_body = DocumentoElectronicoPayload,
    responses(
        (status = 200, description = "Documento eletrônico emitido; message traz o id"),
        (status = 404, description = "Pessoa referenciada não existe no Contifico")
    )
)]
pub async fn create_doc(
    State(app_state): State<AppState>,
    Json(payload): Json<DocumentoElectronicoPayload>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Recibida solicitud para crear el documento en Contifico.");

    let message = app_state
        .contifico_service
        .create_electronic_document(&payload)
        .await?;
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}
