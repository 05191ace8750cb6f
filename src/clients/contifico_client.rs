// src/clients/contifico_client.rs

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;

use crate::common::error::AppError;
use crate::models::contifico::{
    Bodega, CategoriaPayload, DocumentoContifico, DocumentoElectronicoPayload, IdContifico,
    MovimientoInventarioPayload, PersonaPayload, ProductoPayload,
};

/// Cliente HTTP da API REST do Contifico. Todas as chamadas são sequenciais
/// e autenticadas com o token estático da conta.
#[derive(Clone)]
pub struct ContificoClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl ContificoClient {
    pub fn new(base_url: String, auth_token: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Falha ao criar o cliente HTTP");
        Self {
            http,
            base_url,
            auth_token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.auth_token))
    }

    // Converte uma resposta não-2xx no nosso erro, repassando a mensagem que
    // o Contifico devolveu ({"mensaje": ...}) e o id quando o corpo trouxer
    // um (cadastro duplicado devolve o id já existente).
    async fn check(&self, response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Contifico devolveu {}: {}", status, body);

        let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("mensaje"))
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    "Error al comunicarse con Contifico".to_string()
                } else {
                    body.clone()
                }
            });
        let external_id = parsed
            .as_ref()
            .and_then(|v| v.get("id"))
            .and_then(|id| id.as_str())
            .map(String::from);

        Err(AppError::ExternalApi {
            status: status.as_u16(),
            message,
            external_id,
        })
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, AppError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        self.check(response).await
    }

    /// GET /registro/documento/ — documentos de venda emitidos na data
    /// (DD/MM/YYYY). O endpoint de leitura usa o token cru no header.
    pub async fn listar_documentos(
        &self,
        fecha_emision: &str,
    ) -> Result<Vec<DocumentoContifico>, AppError> {
        let path = format!(
            "/registro/documento/?tipo_registro=CLI&fecha_emision={}",
            fecha_emision
        );
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", self.auth_token.clone())
            .send()
            .await?;
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }

    /// POST /categoria/ — devolve o id da categoria criada.
    pub async fn crear_categoria(&self, payload: &CategoriaPayload) -> Result<String, AppError> {
        let response = self.post_json("/categoria/", payload).await?;
        let creado: IdContifico = response.json().await?;
        Ok(creado.id)
    }

    /// POST /producto/ — produtos e serviços compartilham o endpoint.
    pub async fn crear_producto(&self, payload: &ProductoPayload) -> Result<String, AppError> {
        let response = self.post_json("/producto/", payload).await?;
        let creado: IdContifico = response.json().await?;
        Ok(creado.id)
    }

    /// GET /bodega/ — lista de bodegas; o pipeline usa a primeira.
    pub async fn listar_bodegas(&self) -> Result<Vec<Bodega>, AppError> {
        let response = self.request(Method::GET, "/bodega/").send().await?;
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }

    /// POST /movimiento-inventario/.
    pub async fn crear_movimiento(
        &self,
        payload: &MovimientoInventarioPayload,
    ) -> Result<(), AppError> {
        self.post_json("/movimiento-inventario/", payload).await?;
        Ok(())
    }

    /// POST /persona/?pos=<token> — cadastro de pessoa (cliente/vendedor).
    pub async fn crear_persona(&self, payload: &PersonaPayload) -> Result<String, AppError> {
        let path = format!("/persona/?pos={}", self.auth_token);
        let response = self.post_json(&path, payload).await?;
        let creado: IdContifico = response.json().await?;
        Ok(creado.id)
    }

    /// GET /persona/{id}/ — None quando o Contifico devolve 404.
    pub async fn obtener_persona(
        &self,
        persona_id: &str,
    ) -> Result<Option<serde_json::Value>, AppError> {
        let path = format!("/persona/{}/", persona_id);
        let response = self.request(Method::GET, &path).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check(response).await?;
        Ok(Some(response.json().await?))
    }

    /// POST /documento/ — documento eletrônico completo. O token POS é
    /// injetado aqui; o que vier do chamador é descartado.
    pub async fn crear_documento(
        &self,
        payload: &DocumentoElectronicoPayload,
    ) -> Result<String, AppError> {
        let mut payload = payload.clone();
        payload.pos = Some(self.auth_token.clone());
        let response = self.post_json("/documento/", &payload).await?;
        let creado: IdContifico = response.json().await?;
        Ok(creado.id)
    }
}
