// src/models/contifico.rs

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

// Fuso fixo do Equador (America/Guayaquil, UTC-5, sem horário de verão).
const GUAYAQUIL_OFFSET_SECS: i32 = -5 * 3600;

pub fn guayaquil_offset() -> FixedOffset {
    FixedOffset::east_opt(GUAYAQUIL_OFFSET_SECS).expect("offset fixo válido")
}

/// Data de "hoje" no fuso de Guayaquil, no formato DD/MM/YYYY que o
/// Contifico espera nos filtros e nos movimentos de inventário.
pub fn fecha_guayaquil(now: DateTime<Utc>) -> String {
    now.with_timezone(&guayaquil_offset())
        .format("%d/%m/%Y")
        .to_string()
}

/// Converte uma data DD/MM/YYYY do Contifico para um instante UTC
/// (meia-noite). Datas malformadas viram None e o campo fica nulo.
pub fn convertir_fecha(fecha: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(fecha, "%d/%m/%Y").ok()?;
    Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

// O Contifico devolve valores monetários ora como número, ora como string
// ("12.50"). Aceitamos os dois.
fn decimal_flexible<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumeroOuTexto {
        Numero(f64),
        Texto(String),
    }

    match NumeroOuTexto::deserialize(deserializer)? {
        NumeroOuTexto::Numero(n) => {
            Decimal::try_from(n).map_err(serde::de::Error::custom)
        }
        NumeroOuTexto::Texto(s) => {
            Decimal::from_str(s.trim()).map_err(serde::de::Error::custom)
        }
    }
}

fn decimal_flexible_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "decimal_flexible")] Decimal);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

// Comprovantes chegam como número ou string, dependendo da forma de cobro.
fn texto_flexible_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextoOuNumero {
        Texto(String),
        Numero(i64),
    }

    Ok(Option::<TextoOuNumero>::deserialize(deserializer)?.map(|v| match v {
        TextoOuNumero::Texto(s) => s,
        TextoOuNumero::Numero(n) => n.to_string(),
    }))
}

// ---
// Documentos de venda (leitura)
// ---

/// Um documento de venda retornado por GET /registro/documento/.
/// Efêmero: é reprocessado a cada execução e nunca persistido inteiro.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentoContifico {
    pub id: String,
    pub fecha_emision: String,
    pub estado: String,
    /// Número do documento, ex.: "001-002-000123". O primeiro segmento é o
    /// código do estabelecimento.
    pub documento: String,
    #[serde(default)]
    pub url_ride: Option<String>,
    #[serde(default, deserialize_with = "decimal_flexible_opt")]
    pub subtotal_12: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal_flexible_opt")]
    pub iva: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal_flexible_opt")]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub detalles: Vec<DetalleContifico>,
    #[serde(default)]
    pub cobros: Vec<CobroContifico>,
    #[serde(default)]
    pub cliente: Option<PersonaDocumento>,
    #[serde(default)]
    pub vendedor: Option<PersonaDocumento>,
}

impl DocumentoContifico {
    /// Código do estabelecimento: primeiro segmento antes do hífen.
    pub fn numero_establecimiento(&self) -> &str {
        self.documento.split('-').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetalleContifico {
    pub producto_id: String,
    #[serde(deserialize_with = "decimal_flexible")]
    pub cantidad: Decimal,
    #[serde(deserialize_with = "decimal_flexible")]
    pub precio: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CobroContifico {
    pub forma_cobro: String,
    #[serde(default, deserialize_with = "texto_flexible_opt")]
    pub numero_comprobante: Option<String>,
    pub fecha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonaDocumento {
    #[serde(default)]
    pub cedula: Option<String>,
}

// ---
// Payloads de escrita (provisionamento)
// ---

#[derive(Debug, Clone, Serialize)]
pub struct CategoriaPayload {
    pub nombre: String,
    pub tipo_producto: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductoPayload {
    pub tipo: String,
    pub nombre: String,
    pub descripcion: String,
    pub categoria_id: Option<String>,
    pub minimo: i32,
    pub pvp1: Decimal,
    pub estado: String,
    pub codigo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovimientoInventarioPayload {
    pub tipo: String,
    pub bodega_id: String,
    pub detalles: Vec<DetalleMovimiento>,
    pub fecha: String,
    pub descripcion: String,
}

/// Linha de movimento de inventário como chega do chamador HTTP; vira um
/// DetalleMovimiento no payload do Contifico.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovInvDetalle {
    pub id: String,
    pub cantidad: Decimal,
    #[serde(default)]
    pub precio: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetalleMovimiento {
    pub producto_id: String,
    pub cantidad: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonaPayload {
    pub tipo: String,
    pub cedula: Option<String>,
    pub razon_social: Option<String>,
    pub telefonos: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    pub es_cliente: bool,
    pub es_empleado: bool,
    pub es_vendedor: bool,
    pub es_proveedor: bool,
}

// Documento eletrônico completo (POST /documento/).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentoElectronicoPayload {
    /// Token POS; preenchido pelo cliente HTTP antes do envio.
    #[serde(default)]
    pub pos: Option<String>,
    pub fecha_emision: String,
    pub tipo_documento: String,
    pub documento: Option<String>,
    pub autorizacion: Option<String>,
    pub cliente: PersonaDocumentoPayload,
    pub vendedor: Option<PersonaDocumentoPayload>,
    pub descripcion: Option<String>,
    pub detalles: Vec<DetalleDocumentoPayload>,
    pub cobros: Vec<CobroPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PersonaDocumentoPayload {
    pub id: Option<String>,
    pub tipo: String,
    pub cedula: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: String,
    pub telefonos: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DetalleDocumentoPayload {
    pub producto_id: String,
    pub cantidad: Decimal,
    pub precio: Decimal,
    pub porcentaje_iva: Decimal,
    pub porcentaje_descuento: Decimal,
    pub base_cero: Decimal,
    pub base_gravable: Decimal,
    pub base_no_gravable: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CobroPayload {
    pub forma_cobro: String,
    pub monto: Decimal,
    pub fecha: String,
}

// ---
// Respostas do Contifico
// ---

#[derive(Debug, Clone, Deserialize)]
pub struct IdContifico {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bodega {
    pub id: String,
    #[serde(default)]
    pub nombre: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fecha_guayaquil_cruza_meia_noite() {
        // 03:30 UTC ainda é o dia anterior no Equador (22:30).
        let utc = Utc.with_ymd_and_hms(2025, 6, 2, 3, 30, 0).unwrap();
        assert_eq!(fecha_guayaquil(utc), "01/06/2025");

        let tarde = Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap();
        assert_eq!(fecha_guayaquil(tarde), "02/06/2025");
    }

    #[test]
    fn convertir_fecha_aceita_dd_mm_yyyy() {
        let fecha = convertir_fecha("01/06/2025").unwrap();
        assert_eq!(fecha, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        assert!(convertir_fecha("2025-06-01").is_none());
        assert!(convertir_fecha("garbage").is_none());
    }

    #[test]
    fn documento_deserializa_valores_em_string_ou_numero() {
        let json = r#"{
            "id": "D1",
            "fecha_emision": "01/06/2025",
            "estado": "C",
            "documento": "001-002-000123",
            "subtotal_12": "17.86",
            "iva": 12,
            "total": 20.0,
            "detalles": [{"producto_id": "P1", "cantidad": 2, "precio": "10.00"}],
            "cobros": [{"forma_cobro": "TC", "numero_comprobante": 991, "fecha": "01/06/2025"}],
            "cliente": {"cedula": "0101"},
            "vendedor": {"cedula": "0202"}
        }"#;

        let doc: DocumentoContifico = serde_json::from_str(json).unwrap();
        assert_eq!(doc.subtotal_12, Some(Decimal::from_str("17.86").unwrap()));
        assert_eq!(doc.iva, Some(Decimal::from(12)));
        assert_eq!(doc.detalles[0].precio, Decimal::from(10));
        assert_eq!(doc.cobros[0].numero_comprobante.as_deref(), Some("991"));
        assert_eq!(doc.numero_establecimiento(), "001");
    }

    #[test]
    fn documento_tolera_campos_ausentes() {
        let json = r#"{"id": "D2", "fecha_emision": "01/06/2025", "estado": "P", "documento": "002-001-000001"}"#;
        let doc: DocumentoContifico = serde_json::from_str(json).unwrap();
        assert!(doc.detalles.is_empty());
        assert!(doc.cobros.is_empty());
        assert!(doc.vendedor.is_none());
    }
}
