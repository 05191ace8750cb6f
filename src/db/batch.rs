// src/db/batch.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, OrdersRepository, StatisticsRepository, UsersRepository},
    models::{
        catalog::CatalogTable,
        orders::{FinancialProjection, NewOrder, NewServicioFacturado},
        statistics::{MonthlyStatistic, StatDeltas},
    },
};

/// Teto de operações por lote atômico, herdado do limite do armazenamento
/// de documentos contra o qual este fluxo foi desenhado.
pub const MAX_OPERACOES_POR_LOTE: usize = 500;

fn precisa_flush(staged: usize) -> bool {
    staged >= MAX_OPERACOES_POR_LOTE
}

/// Uma escrita adiada, executada quando o lote é confirmado. Cada variante
/// corresponde a uma operação de domínio, nunca a SQL arbitrário.
#[derive(Debug)]
pub enum StagedWrite {
    CreateStatistic(MonthlyStatistic),
    IncrementStatistic {
        bucket_id: Uuid,
        deltas: StatDeltas,
        run_token: Uuid,
        at: DateTime<Utc>,
    },
    CreateOrder(NewOrder),
    UpdateOrder {
        order_id: Uuid,
        projection: FinancialProjection,
    },
    CreateServicioFacturado(NewServicioFacturado),
    UpdateServicioFacturado {
        servicio_id: Uuid,
        projection: FinancialProjection,
    },
    SetIdContifico {
        table: CatalogTable,
        record_id: Uuid,
        id_contifico: String,
    },
    SetRegCompRrss {
        user_id: Uuid,
        valor: bool,
    },
}

/// Acumula escritas e confirma em sub-lotes de até 500 operações, cada um
/// em uma transação própria. Um run deixa de ser atômico como um todo: se
/// um sub-lote falhar, os anteriores permanecem aplicados (o token de
/// execução nos incrementos de estatística cobre o retry).
pub struct BatchWriter {
    pool: PgPool,
    staged: Vec<StagedWrite>,
    committed: usize,
    statistics_repo: StatisticsRepository,
    orders_repo: OrdersRepository,
    catalog_repo: CatalogRepository,
    users_repo: UsersRepository,
}

impl BatchWriter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            statistics_repo: StatisticsRepository::new(pool.clone()),
            orders_repo: OrdersRepository::new(pool.clone()),
            catalog_repo: CatalogRepository::new(pool.clone()),
            users_repo: UsersRepository::new(pool.clone()),
            pool,
            staged: Vec::new(),
            committed: 0,
        }
    }

    /// Registra uma escrita. Ao atingir o teto, o lote atual é confirmado e
    /// um novo começa.
    pub async fn stage(&mut self, write: StagedWrite) -> Result<(), AppError> {
        self.staged.push(write);
        if precisa_flush(self.staged.len()) {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), AppError> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let ops = self.staged.len();
        let mut tx = self.pool.begin().await?;

        for write in self.staged.drain(..) {
            match write {
                StagedWrite::CreateStatistic(bucket) => {
                    self.statistics_repo.insert_bucket(&mut *tx, &bucket).await?;
                }
                StagedWrite::IncrementStatistic {
                    bucket_id,
                    deltas,
                    run_token,
                    at,
                } => {
                    self.statistics_repo
                        .increment_bucket(&mut *tx, bucket_id, &deltas, run_token, at)
                        .await?;
                }
                StagedWrite::CreateOrder(order) => {
                    self.orders_repo.insert_order(&mut *tx, &order).await?;
                }
                StagedWrite::UpdateOrder {
                    order_id,
                    projection,
                } => {
                    self.orders_repo
                        .update_order(&mut *tx, order_id, &projection)
                        .await?;
                }
                StagedWrite::CreateServicioFacturado(servicio) => {
                    self.orders_repo
                        .insert_servicio_facturado(&mut *tx, &servicio)
                        .await?;
                }
                StagedWrite::UpdateServicioFacturado {
                    servicio_id,
                    projection,
                } => {
                    self.orders_repo
                        .update_servicio_facturado(&mut *tx, servicio_id, &projection)
                        .await?;
                }
                StagedWrite::SetIdContifico {
                    table,
                    record_id,
                    id_contifico,
                } => {
                    self.catalog_repo
                        .set_id_contifico(&mut *tx, table, record_id, &id_contifico)
                        .await?;
                }
                StagedWrite::SetRegCompRrss { user_id, valor } => {
                    self.users_repo
                        .set_reg_comp_rrss(&mut *tx, user_id, valor)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        self.committed += ops;
        tracing::info!("Lote de {} operações confirmado", ops);
        Ok(())
    }

    /// Confirma o que restou e devolve o total de operações aplicadas.
    pub async fn finish(mut self) -> Result<usize, AppError> {
        self.flush().await?;
        Ok(self.committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_dispara_exatamente_no_teto() {
        assert!(!precisa_flush(0));
        assert!(!precisa_flush(MAX_OPERACOES_POR_LOTE - 1));
        assert!(precisa_flush(MAX_OPERACOES_POR_LOTE));
        assert!(precisa_flush(MAX_OPERACOES_POR_LOTE + 1));
    }

    #[test]
    fn uma_execucao_grande_quebra_em_tres_lotes() {
        // 1200 escritas: dois lotes cheios disparam no teto e sobram 200
        // para o finish.
        let mut staged = 0usize;
        let mut lotes = Vec::new();
        for _ in 0..1200 {
            staged += 1;
            if precisa_flush(staged) {
                lotes.push(staged);
                staged = 0;
            }
        }
        if staged > 0 {
            lotes.push(staged);
        }
        assert_eq!(lotes, vec![500, 500, 200]);
    }
}
