// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Contifico ---
        handlers::contifico::obtener_documentos,
        handlers::contifico::barrido_catalogo,
        handlers::contifico::create_category,
        handlers::contifico::create_prod_serv,
        handlers::contifico::create_mov_inv,
        handlers::contifico::create_user,
        handlers::contifico::create_doc,
    ),
    components(
        schemas(
            handlers::contifico::CreateCategoryPayload,
            handlers::contifico::CreateProdServPayload,
            handlers::contifico::CreateMovInvPayload,
            handlers::contifico::CreateUserPayload,
            models::contifico::MovInvDetalle,
            models::contifico::DocumentoElectronicoPayload,
            models::contifico::PersonaDocumentoPayload,
            models::contifico::DetalleDocumentoPayload,
            models::contifico::CobroPayload,
            models::orders::OrderStatus,
            models::orders::PaymentMethod,
        )
    ),
    tags(
        (name = "Contifico", description = "Sincronização e provisionamento no Contifico")
    )
)]
pub struct ApiDoc;
