// src/services/contifico_service.rs

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    clients::ContificoClient,
    common::error::AppError,
    models::contifico::{
        CategoriaPayload, DetalleMovimiento, DocumentoElectronicoPayload, MovInvDetalle,
        MovimientoInventarioPayload, PersonaPayload, ProductoPayload, fecha_guayaquil,
    },
};

/// Operações de provisionamento no Contifico: categorias, produtos e
/// serviços, movimentos de inventário, pessoas e documentos eletrônicos.
/// Valida localmente antes de chamar a API; o id devolvido vira a
/// referência cruzada (id_contifico) que o chamador persiste.
#[derive(Clone)]
pub struct ContificoService {
    contifico: ContificoClient,
}

impl ContificoService {
    pub fn new(contifico: ContificoClient) -> Self {
        Self { contifico }
    }

    pub async fn create_category(&self, nombre: &str, tipo: &str) -> Result<String, AppError> {
        if nombre.trim().is_empty() {
            return Err(AppError::Validation(
                "El nombre de la categoría es obligatorio".to_string(),
            ));
        }
        if tipo != "PROD" && tipo != "SERV" {
            return Err(AppError::Validation(
                "El tipo de categoría debe ser \"PROD\" o \"SERV\"".to_string(),
            ));
        }

        self.contifico
            .crear_categoria(&CategoriaPayload {
                nombre: nombre.to_string(),
                tipo_producto: tipo.to_string(),
            })
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_product_or_service(
        &self,
        tipo: &str,
        nombre: &str,
        descripcion: Option<&str>,
        categoria: Option<&str>,
        precio: Decimal,
        compra: Option<Decimal>,
        stock: Option<Decimal>,
        sku: Option<&str>,
        estado: bool,
    ) -> Result<String, AppError> {
        if precio <= Decimal::ZERO {
            return Err(AppError::Validation(
                "El precio debe ser mayor a 0 para registrar el producto/servicio".to_string(),
            ));
        }
        if tipo.trim().is_empty() {
            return Err(AppError::Validation(
                "El tipo de producto/servicio es obligatorio para registrar el producto/servicio"
                    .to_string(),
            ));
        }
        let categoria = match categoria {
            Some(c) if !c.trim().is_empty() => c,
            _ => {
                return Err(AppError::Validation(
                    "La categoría del producto/servicio es obligatoria para registrar el producto/servicio"
                        .to_string(),
                ));
            }
        };
        if tipo != "PROD" && tipo != "SERV" {
            return Err(AppError::Validation(
                "El tipo de producto/servicio debe ser \"PROD\" o \"SERV\"".to_string(),
            ));
        }
        if tipo == "PROD" && sku.is_none_or(|s| s.trim().is_empty()) {
            return Err(AppError::Validation(
                "El SKU del producto es obligatorio para registrar el producto".to_string(),
            ));
        }
        let stock = stock.unwrap_or(Decimal::ZERO);
        // Estoque inicial exige custo de compra, senão o movimento ING que
        // vem logo depois seria rejeitado.
        if stock > Decimal::ZERO && compra.is_none_or(|c| c <= Decimal::ZERO) {
            return Err(AppError::Validation(
                "El precio de compra debe ser mayor a 0 para registrar el movimiento de inventario"
                    .to_string(),
            ));
        }
        if nombre.trim().is_empty() {
            return Err(AppError::Validation(
                "El nombre del producto/servicio es obligatorio para registrar el producto/servicio"
                    .to_string(),
            ));
        }

        let payload = ProductoPayload {
            tipo: tipo.to_string(),
            nombre: nombre.to_string(),
            descripcion: descripcion.unwrap_or_default().to_string(),
            categoria_id: Some(categoria.to_string()),
            minimo: 1,
            pvp1: precio,
            estado: if estado { "A" } else { "I" }.to_string(),
            codigo: sku.map(String::from),
        };
        let producto_id = self.contifico.crear_producto(&payload).await?;

        // Sem estoque inicial, nada mais a fazer.
        if stock <= Decimal::ZERO {
            return Ok(producto_id);
        }

        self.create_inventory_movement(
            "ING",
            &[MovInvDetalle {
                id: producto_id.clone(),
                cantidad: stock,
                precio: compra,
            }],
            Some("Ingreso de Inventario"),
        )
        .await?;

        Ok(producto_id)
    }

    pub async fn create_inventory_movement(
        &self,
        tipo: &str,
        detalles: &[MovInvDetalle],
        descripcion: Option<&str>,
    ) -> Result<(), AppError> {
        if tipo != "ING" && tipo != "EGR" {
            return Err(AppError::Validation(
                "El tipo de movimiento debe ser \"ING\" o \"EGR\"".to_string(),
            ));
        }
        if tipo == "ING" {
            for detalle in detalles {
                let precio = detalle.precio.ok_or_else(|| {
                    AppError::Validation(format!(
                        "El producto/servicio con ID {} debe tener un precio para un movimiento de ingreso (ING).",
                        detalle.id
                    ))
                })?;
                if precio <= Decimal::ZERO {
                    return Err(AppError::Validation(format!(
                        "El precio del producto/servicio con ID {} no puede ser negativo o 0.",
                        detalle.id
                    )));
                }
            }
        }

        // O movimento entra na primeira bodega da conta.
        let bodegas = self.contifico.listar_bodegas().await?;
        let bodega_id = bodegas
            .into_iter()
            .next()
            .map(|b| b.id)
            .ok_or_else(|| {
                AppError::Validation(
                    "No se encontró una bodega para registrar el movimiento de inventario"
                        .to_string(),
                )
            })?;

        let payload = MovimientoInventarioPayload {
            tipo: tipo.to_string(),
            bodega_id,
            detalles: detalles
                .iter()
                .map(|d| DetalleMovimiento {
                    producto_id: d.id.clone(),
                    cantidad: d.cantidad,
                    precio: d.precio,
                })
                .collect(),
            fecha: fecha_guayaquil(Utc::now()),
            descripcion: descripcion
                .filter(|d| !d.trim().is_empty())
                .unwrap_or("Movimiento de inventario")
                .to_string(),
        };

        self.contifico.crear_movimiento(&payload).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_client(
        &self,
        cedula: &str,
        razon_social: &str,
        telefono: Option<&str>,
        email: Option<&str>,
        direccion: Option<&str>,
        es_cliente: bool,
        es_empleado: bool,
        es_vendedor: bool,
    ) -> Result<String, AppError> {
        let payload = PersonaPayload {
            tipo: "N".to_string(),
            cedula: Some(cedula.to_string()),
            razon_social: Some(razon_social.to_string()),
            telefonos: telefono.map(String::from),
            email: email.map(String::from),
            direccion: direccion.map(String::from),
            es_cliente,
            es_empleado,
            es_vendedor,
            es_proveedor: false,
        };

        self.contifico.crear_persona(&payload).await
    }

    /// Documento eletrônico completo. Quando o bloco do cliente referencia
    /// uma pessoa por id, confirmamos que ela existe antes de emitir.
    pub async fn create_electronic_document(
        &self,
        payload: &DocumentoElectronicoPayload,
    ) -> Result<String, AppError> {
        if payload.detalles.is_empty() {
            return Err(AppError::Validation(
                "El documento debe tener al menos un detalle".to_string(),
            ));
        }
        if let Some(persona_id) = &payload.cliente.id {
            if self.contifico.obtener_persona(persona_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "La persona {} no existe en Contifico",
                    persona_id
                )));
            }
        }

        self.contifico.crear_documento(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // As validações falham antes de qualquer chamada HTTP, então dá para
    // exercitá-las com um cliente apontando para lugar nenhum.
    fn service() -> ContificoService {
        ContificoService::new(ContificoClient::new(
            "http://contifico.invalid".to_string(),
            "token-de-teste".to_string(),
        ))
    }

    fn assert_validation(result: Result<String, AppError>, fragmento: &str) {
        match result {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains(fragmento), "mensagem inesperada: {}", msg)
            }
            other => panic!("esperava erro de validação, veio {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn categoria_exige_tipo_conhecido() {
        let svc = service();
        assert_validation(
            svc.create_category("Tintes", "OTRO").await,
            "PROD",
        );
        assert_validation(svc.create_category("", "PROD").await, "nombre");
    }

    #[tokio::test]
    async fn producto_exige_precio_positivo() {
        let svc = service();
        let result = svc
            .create_product_or_service(
                "PROD",
                "Shampoo",
                None,
                Some("CAT1"),
                Decimal::ZERO,
                None,
                None,
                Some("SKU-1"),
                true,
            )
            .await;
        assert_validation(result, "El precio debe ser mayor a 0");
    }

    #[tokio::test]
    async fn producto_exige_categoria_y_sku() {
        let svc = service();
        let sin_categoria = svc
            .create_product_or_service(
                "PROD",
                "Shampoo",
                None,
                None,
                Decimal::from(10),
                None,
                None,
                Some("SKU-1"),
                true,
            )
            .await;
        assert_validation(sin_categoria, "La categoría");

        let sin_sku = svc
            .create_product_or_service(
                "PROD",
                "Shampoo",
                None,
                Some("CAT1"),
                Decimal::from(10),
                None,
                None,
                None,
                true,
            )
            .await;
        assert_validation(sin_sku, "El SKU del producto");
    }

    #[tokio::test]
    async fn servicio_no_exige_sku() {
        let svc = service();
        // SERV sem SKU passa das validações e só então falha na rede.
        let result = svc
            .create_product_or_service(
                "SERV",
                "Corte de cabello",
                None,
                Some("CAT1"),
                Decimal::from(10),
                None,
                None,
                None,
                true,
            )
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi { .. })));
    }

    #[tokio::test]
    async fn stock_inicial_exige_precio_de_compra() {
        let svc = service();
        let result = svc
            .create_product_or_service(
                "PROD",
                "Shampoo",
                None,
                Some("CAT1"),
                Decimal::from(10),
                None,
                Some(Decimal::from(5)),
                Some("SKU-1"),
                true,
            )
            .await;
        assert_validation(result, "El precio de compra");
    }

    #[tokio::test]
    async fn movimiento_ing_exige_precio_en_cada_linea() {
        let svc = service();
        let detalles = [MovInvDetalle {
            id: "P1".to_string(),
            cantidad: Decimal::from(3),
            precio: None,
        }];
        let result = svc
            .create_inventory_movement("ING", &detalles, None)
            .await
            .map(|_| String::new());
        assert_validation(result, "debe tener un precio");

        let detalles = [MovInvDetalle {
            id: "P1".to_string(),
            cantidad: Decimal::from(3),
            precio: Some(Decimal::ZERO),
        }];
        let result = svc
            .create_inventory_movement("ING", &detalles, None)
            .await
            .map(|_| String::new());
        assert_validation(result, "no puede ser negativo o 0");
    }

    #[tokio::test]
    async fn movimiento_exige_tipo_conocido() {
        let svc = service();
        let result = svc
            .create_inventory_movement("XXX", &[], None)
            .await
            .map(|_| String::new());
        assert_validation(result, "ING");
    }
}
