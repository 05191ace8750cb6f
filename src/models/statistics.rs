// src/models/statistics.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Balde de contadores mensais. Identificado por (year, month) mais no
/// máximo UMA referência de dimensão não-nula; todas nulas = balde global.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatistic {
    pub id: Uuid,
    pub year: i32,
    pub month: i32,
    pub store_ref: Option<Uuid>,
    pub asesor_ref: Option<Uuid>,
    pub client_ref: Option<Uuid>,
    pub product_ref: Option<Uuid>,
    pub service_ref: Option<Uuid>,
    pub product_total_value: Decimal,
    pub service_total_value: Decimal,
    pub product_count: Decimal,
    pub service_count: Decimal,
    pub total_value: Decimal,
    pub total_transactions: i64,
    pub last_update: DateTime<Utc>,
    pub last_run_token: Option<Uuid>,
}

impl MonthlyStatistic {
    /// Balde recém-criado para a dimensão, com contadores zerados.
    pub fn nuevo(
        year: i32,
        month: i32,
        dimension: &StatDimension,
        now: DateTime<Utc>,
    ) -> Self {
        let (store_ref, asesor_ref, client_ref, product_ref, service_ref) = dimension.refs();
        MonthlyStatistic {
            id: Uuid::new_v4(),
            year,
            month,
            store_ref,
            asesor_ref,
            client_ref,
            product_ref,
            service_ref,
            product_total_value: Decimal::ZERO,
            service_total_value: Decimal::ZERO,
            product_count: Decimal::ZERO,
            service_count: Decimal::ZERO,
            total_value: Decimal::ZERO,
            total_transactions: 0,
            last_update: now,
            last_run_token: None,
        }
    }
}

/// A dimensão de um balde: global ou exatamente uma referência.
/// O tipo torna impossível combinar duas referências no mesmo balde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatDimension {
    Global,
    Store(Uuid),
    Asesor(Uuid),
    Client(Uuid),
    Product(Uuid),
    Service(Uuid),
}

impl StatDimension {
    /// Expande a dimensão nas cinco colunas de referência, na ordem
    /// (store, asesor, client, product, service).
    pub fn refs(
        &self,
    ) -> (
        Option<Uuid>,
        Option<Uuid>,
        Option<Uuid>,
        Option<Uuid>,
        Option<Uuid>,
    ) {
        match *self {
            StatDimension::Global => (None, None, None, None, None),
            StatDimension::Store(id) => (Some(id), None, None, None, None),
            StatDimension::Asesor(id) => (None, Some(id), None, None, None),
            StatDimension::Client(id) => (None, None, Some(id), None, None),
            StatDimension::Product(id) => (None, None, None, Some(id), None),
            StatDimension::Service(id) => (None, None, None, None, Some(id)),
        }
    }
}

/// Incrementos acumulados para um balde durante uma execução. Aplicados ao
/// final como um único UPDATE aditivo por balde.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatDeltas {
    pub product_total_value: Decimal,
    pub service_total_value: Decimal,
    pub product_count: Decimal,
    pub service_count: Decimal,
    pub total_value: Decimal,
    pub total_transactions: i64,
}

impl StatDeltas {
    /// Contribuição de uma linha de produto: total da linha e quantidade.
    pub fn product_line(total: Decimal, cantidad: Decimal) -> Self {
        StatDeltas {
            product_total_value: total,
            product_count: cantidad,
            total_value: total,
            total_transactions: 1,
            ..StatDeltas::default()
        }
    }

    pub fn service_line(total: Decimal, cantidad: Decimal) -> Self {
        StatDeltas {
            service_total_value: total,
            service_count: cantidad,
            total_value: total,
            total_transactions: 1,
            ..StatDeltas::default()
        }
    }

    pub fn add(&mut self, other: &StatDeltas) {
        self.product_total_value += other.product_total_value;
        self.service_total_value += other.service_total_value;
        self.product_count += other.product_count;
        self.service_count += other.service_count;
        self.total_value += other.total_value;
        self.total_transactions += other.total_transactions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensao_expande_no_maximo_uma_referencia() {
        let id = Uuid::new_v4();
        let dims = [
            StatDimension::Global,
            StatDimension::Store(id),
            StatDimension::Asesor(id),
            StatDimension::Client(id),
            StatDimension::Product(id),
            StatDimension::Service(id),
        ];
        for dim in dims {
            let (s, a, c, p, sv) = dim.refs();
            let non_null = [s, a, c, p, sv].iter().filter(|r| r.is_some()).count();
            let esperado = if dim == StatDimension::Global { 0 } else { 1 };
            assert_eq!(non_null, esperado, "dimensão {:?}", dim);
        }
    }

    #[test]
    fn deltas_acumulam_linhas_de_produto_e_servico() {
        let mut deltas = StatDeltas::default();
        deltas.add(&StatDeltas::product_line(Decimal::from(20), Decimal::from(2)));
        deltas.add(&StatDeltas::service_line(Decimal::from(15), Decimal::from(1)));

        assert_eq!(deltas.product_total_value, Decimal::from(20));
        assert_eq!(deltas.product_count, Decimal::from(2));
        assert_eq!(deltas.service_total_value, Decimal::from(15));
        assert_eq!(deltas.service_count, Decimal::from(1));
        assert_eq!(deltas.total_value, Decimal::from(35));
        assert_eq!(deltas.total_transactions, 2);
    }

}
