// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

// Estados do pedido, mapeados a partir do código de uma letra do Contifico.
// Os nomes com underscore são o contrato gravado no banco e no JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    #[sqlx(rename = "Pago_Pendiente")]
    #[serde(rename = "Pago_Pendiente")]
    PagoPendiente,
    #[sqlx(rename = "Pago_Por_Validar")]
    #[serde(rename = "Pago_Por_Validar")]
    PagoPorValidar,
    #[sqlx(rename = "En_proceso")]
    #[serde(rename = "En_proceso")]
    EnProceso,
    #[sqlx(rename = "Cancelado")]
    #[serde(rename = "Cancelado")]
    Cancelado,
    #[sqlx(rename = "Enviado")]
    #[serde(rename = "Enviado")]
    Enviado,
    #[sqlx(rename = "Completado")]
    #[serde(rename = "Completado")]
    Completado,
}

impl OrderStatus {
    /// Mapeia o código `estado` do Contifico. Códigos desconhecidos caem em
    /// Completado.
    pub fn from_estado(estado: &str) -> Self {
        match estado {
            "P" => OrderStatus::PagoPendiente,
            "C" => OrderStatus::PagoPorValidar,
            "G" => OrderStatus::EnProceso,
            "A" => OrderStatus::Cancelado,
            "E" => OrderStatus::Enviado,
            _ => OrderStatus::Completado,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method")]
pub enum PaymentMethod {
    #[sqlx(rename = "creditCard")]
    #[serde(rename = "creditCard")]
    CreditCard,
    #[sqlx(rename = "bankTransfer")]
    #[serde(rename = "bankTransfer")]
    BankTransfer,
    #[sqlx(rename = "payInStore")]
    #[serde(rename = "payInStore")]
    PayInStore,
}

impl PaymentMethod {
    pub fn from_forma_cobro(forma: &str) -> Self {
        match forma {
            "TC" => PaymentMethod::CreditCard,
            "TRA" => PaymentMethod::BankTransfer,
            _ => PaymentMethod::PayInStore,
        }
    }
}

// --- Linhas resolvidas ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineItem {
    pub service_id: Uuid,
    pub quantity: Decimal,
    pub total_price: Decimal,
}

// --- Projeção financeira ---

/// Os campos de um Order / servicio facturado que a sincronização recalcula
/// e sobrescreve a cada execução. Os campos de workflow ficam de fora de
/// propósito: nunca são tocados depois da criação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProjection {
    pub id_contifico: String,
    pub order_date: Option<DateTime<Utc>>,
    pub url_ride: Option<String>,
    pub order_status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total_value: Decimal,
    pub payment_transaction_id: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_methods: Option<PaymentMethod>,
    pub client_user_id: Option<Uuid>,
}

/// Pedido novo: projeção + linhas de produto + número sequencial.
/// Os defaults de workflow (pickup, custos zerados, datas nulas) ficam no
/// INSERT do repositório.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub projection: FinancialProjection,
    pub products_list: Vec<OrderLineItem>,
    pub order_number: i64,
}

#[derive(Debug, Clone)]
pub struct NewServicioFacturado {
    pub projection: FinancialProjection,
    pub service_list: Vec<ServiceLineItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapeamento_de_estado_e_total() {
        assert_eq!(OrderStatus::from_estado("P"), OrderStatus::PagoPendiente);
        assert_eq!(OrderStatus::from_estado("C"), OrderStatus::PagoPorValidar);
        assert_eq!(OrderStatus::from_estado("G"), OrderStatus::EnProceso);
        assert_eq!(OrderStatus::from_estado("A"), OrderStatus::Cancelado);
        assert_eq!(OrderStatus::from_estado("E"), OrderStatus::Enviado);
        // Qualquer outro código cai em Completado.
        assert_eq!(OrderStatus::from_estado("F"), OrderStatus::Completado);
        assert_eq!(OrderStatus::from_estado(""), OrderStatus::Completado);
        assert_eq!(OrderStatus::from_estado("p"), OrderStatus::Completado);
    }

    #[test]
    fn mapeamento_de_forma_de_cobro() {
        assert_eq!(PaymentMethod::from_forma_cobro("TC"), PaymentMethod::CreditCard);
        assert_eq!(PaymentMethod::from_forma_cobro("TRA"), PaymentMethod::BankTransfer);
        assert_eq!(PaymentMethod::from_forma_cobro("EF"), PaymentMethod::PayInStore);
        assert_eq!(PaymentMethod::from_forma_cobro(""), PaymentMethod::PayInStore);
    }

    #[test]
    fn line_item_serializa_em_camel_case() {
        let item = OrderLineItem {
            product_id: Uuid::nil(),
            quantity: Decimal::from(2),
            total_price: Decimal::from(20),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("productId").is_some());
        assert!(json.get("totalPrice").is_some());
    }
}
