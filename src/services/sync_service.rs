// src/services/sync_service.rs

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    clients::ContificoClient,
    common::error::AppError,
    db::{
        BatchWriter, CatalogRepository, OrdersRepository, StagedWrite, StatisticsRepository,
        UsersRepository,
    },
    models::{
        catalog::{CatalogTable, Categoria},
        contifico::{
            CategoriaPayload, DocumentoContifico, PersonaPayload, ProductoPayload,
            fecha_guayaquil, guayaquil_offset, convertir_fecha,
        },
        orders::{
            FinancialProjection, NewOrder, NewServicioFacturado, OrderLineItem, OrderStatus,
            PaymentMethod, ServiceLineItem,
        },
        statistics::{MonthlyStatistic, StatDeltas, StatDimension},
    },
};

// ---
// Registro de baldes da execução
// ---

/// Baldes de estatística tocados pela execução corrente. Os deltas de todos
/// os documentos se acumulam aqui e viram UM incremento por balde no final,
/// de modo que dois documentos no mesmo balde nunca se atropelam.
struct BucketRegistry {
    year: i32,
    month: i32,
    entries: HashMap<StatDimension, BucketEntry>,
}

struct BucketEntry {
    id: Uuid,
    deltas: StatDeltas,
}

impl BucketRegistry {
    fn new(year: i32, month: i32) -> Self {
        Self {
            year,
            month,
            entries: HashMap::new(),
        }
    }

    fn bucket_id(&self, dimension: &StatDimension) -> Option<Uuid> {
        self.entries.get(dimension).map(|e| e.id)
    }

    fn register(&mut self, dimension: StatDimension, id: Uuid) {
        self.entries.entry(dimension).or_insert(BucketEntry {
            id,
            deltas: StatDeltas::default(),
        });
    }

    /// Acumula deltas em um balde já resolvido. Dimensões não resolvidas
    /// (loja/assessor/cliente sem cadastro) simplesmente não chegam aqui.
    fn add(&mut self, dimension: &StatDimension, deltas: &StatDeltas) {
        if let Some(entry) = self.entries.get_mut(dimension) {
            entry.deltas.add(deltas);
        }
    }

    fn drain(self) -> Vec<(Uuid, StatDeltas)> {
        self.entries
            .into_values()
            .map(|e| (e.id, e.deltas))
            .collect()
    }
}

// ---
// Projeção financeira de um documento remoto
// ---

fn build_projection(doc: &DocumentoContifico, client_user_id: Option<Uuid>) -> FinancialProjection {
    let subtotal = doc.subtotal_12.unwrap_or(Decimal::ZERO);
    let iva = doc.iva.unwrap_or(Decimal::ONE);
    let cobro = doc.cobros.first();

    FinancialProjection {
        id_contifico: doc.id.clone(),
        order_date: convertir_fecha(&doc.fecha_emision),
        url_ride: doc.url_ride.clone(),
        order_status: OrderStatus::from_estado(&doc.estado),
        subtotal,
        tax: subtotal * iva / Decimal::from(100),
        total_value: doc.total.unwrap_or(Decimal::ZERO),
        payment_transaction_id: cobro.and_then(|c| c.numero_comprobante.clone()),
        payment_date: cobro.and_then(|c| convertir_fecha(&c.fecha)),
        payment_methods: cobro.map(|c| PaymentMethod::from_forma_cobro(&c.forma_cobro)),
        client_user_id,
    }
}

// ---
// Serviço de sincronização
// ---

/// Reconciliação diária com o Contifico: projeta os documentos de venda do
/// dia em orders/servicios_facturados e mantém os contadores mensais.
#[derive(Clone)]
pub struct SyncService {
    pool: PgPool,
    contifico: ContificoClient,
    statistics_repo: StatisticsRepository,
    orders_repo: OrdersRepository,
    catalog_repo: CatalogRepository,
    users_repo: UsersRepository,
}

impl SyncService {
    pub fn new(pool: PgPool, contifico: ContificoClient) -> Self {
        Self {
            statistics_repo: StatisticsRepository::new(pool.clone()),
            orders_repo: OrdersRepository::new(pool.clone()),
            catalog_repo: CatalogRepository::new(pool.clone()),
            users_repo: UsersRepository::new(pool.clone()),
            pool,
            contifico,
        }
    }

    /// Ponto de entrada do job diário. Busca os documentos emitidos "hoje"
    /// (fuso de Guayaquil), processa um a um e confirma as escritas em
    /// sub-lotes de até 500 operações.
    pub async fn sincronizar_documentos(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let fecha = fecha_guayaquil(now);
        let run_token = Uuid::new_v4();

        tracing::info!("Buscando documentos do Contifico emitidos em {}", fecha);
        let docs = self.contifico.listar_documentos(&fecha).await?;

        let hoy = now.with_timezone(&guayaquil_offset());
        let mut registry = BucketRegistry::new(hoy.year(), hoy.month() as i32);
        let mut batch = BatchWriter::new(self.pool.clone());

        for doc in &docs {
            self.procesar_documento(doc, &mut registry, &mut batch, now)
                .await?;
        }

        // Um incremento aditivo por balde tocado, protegido pelo token da
        // execução (retry de um run parcialmente aplicado não conta dobrado).
        for (bucket_id, deltas) in registry.drain() {
            batch
                .stage(StagedWrite::IncrementStatistic {
                    bucket_id,
                    deltas,
                    run_token,
                    at: now,
                })
                .await?;
        }

        let ops = batch.finish().await?;
        tracing::info!(
            "Sincronização concluída: {} documentos, {} operações",
            docs.len(),
            ops
        );

        Ok(format!(
            "{} documentos guardados o actualizados correctamente",
            docs.len()
        ))
    }

    /// Resolve o balde da dimensão: primeiro no registro da execução, depois
    /// no banco; se não existir, põe na fila um create com contadores zerados.
    async fn resolver_bucket(
        &self,
        registry: &mut BucketRegistry,
        batch: &mut BatchWriter,
        dimension: StatDimension,
        now: DateTime<Utc>,
    ) -> Result<Uuid, AppError> {
        if let Some(id) = registry.bucket_id(&dimension) {
            return Ok(id);
        }

        let id = match self
            .statistics_repo
            .find_by_dimension(registry.year, registry.month, &dimension)
            .await?
        {
            Some(bucket) => bucket.id,
            None => {
                let bucket = MonthlyStatistic::nuevo(registry.year, registry.month, &dimension, now);
                let id = bucket.id;
                batch.stage(StagedWrite::CreateStatistic(bucket)).await?;
                id
            }
        };

        registry.register(dimension, id);
        Ok(id)
    }

    async fn procesar_documento(
        &self,
        doc: &DocumentoContifico,
        registry: &mut BucketRegistry,
        batch: &mut BatchWriter,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        // 1. Balde global do mês, sempre.
        self.resolver_bucket(registry, batch, StatDimension::Global, now)
            .await?;

        // 2. Loja, pelo código de estabelecimento do número do documento.
        let store_dim = match self
            .catalog_repo
            .find_local_by_establecimiento(doc.numero_establecimiento())
            .await?
        {
            Some(local) => {
                let dim = StatDimension::Store(local.id);
                self.resolver_bucket(registry, batch, dim, now).await?;
                Some(dim)
            }
            None => None,
        };

        // 3. Assessor (vendedor), pela cédula. Documento sem vendedor pula.
        let asesor_dim = match doc.vendedor.as_ref().and_then(|v| v.cedula.as_deref()) {
            Some(cedula) => match self.users_repo.find_by_cedula(cedula).await? {
                Some(user) => {
                    let dim = StatDimension::Asesor(user.id);
                    self.resolver_bucket(registry, batch, dim, now).await?;
                    Some(dim)
                }
                None => None,
            },
            None => None,
        };

        // 4. Cliente (comprador), pela cédula.
        let client_ref = match doc.cliente.as_ref().and_then(|c| c.cedula.as_deref()) {
            Some(cedula) => self.users_repo.find_by_cedula(cedula).await?.map(|u| u.id),
            None => None,
        };
        let client_dim = match client_ref {
            Some(user_id) => {
                let dim = StatDimension::Client(user_id);
                self.resolver_bucket(registry, batch, dim, now).await?;
                Some(dim)
            }
            None => None,
        };

        // 5. Linhas do documento: produto primeiro, depois serviço; linha
        // sem correspondência no catálogo é descartada com log (o catálogo
        // local pode estar atrás do Contifico, isso não é erro).
        let mut doc_deltas = StatDeltas::default();
        let mut products_list: Vec<OrderLineItem> = Vec::new();
        let mut service_list: Vec<ServiceLineItem> = Vec::new();

        for detalle in &doc.detalles {
            let total = detalle.precio * detalle.cantidad;

            if let Some(producto) = self
                .catalog_repo
                .find_producto_by_contifico(&detalle.producto_id)
                .await?
            {
                products_list.push(OrderLineItem {
                    product_id: producto.id,
                    quantity: detalle.cantidad,
                    total_price: total,
                });

                let line = StatDeltas::product_line(total, detalle.cantidad);
                doc_deltas.add(&line);

                let dim = StatDimension::Product(producto.id);
                self.resolver_bucket(registry, batch, dim, now).await?;
                registry.add(&dim, &line);
            } else if let Some(servicio) = self
                .catalog_repo
                .find_servicio_by_contifico(&detalle.producto_id)
                .await?
            {
                service_list.push(ServiceLineItem {
                    service_id: servicio.id,
                    quantity: detalle.cantidad,
                    total_price: total,
                });

                let line = StatDeltas::service_line(total, detalle.cantidad);
                doc_deltas.add(&line);

                let dim = StatDimension::Service(servicio.id);
                self.resolver_bucket(registry, batch, dim, now).await?;
                registry.add(&dim, &line);
            } else {
                tracing::warn!(
                    "Documento {}: linha com producto_id {} não existe no catálogo local, descartada",
                    doc.id,
                    detalle.producto_id
                );
            }
        }

        // 6. Totais do documento aplicados às dimensões resolvidas.
        registry.add(&StatDimension::Global, &doc_deltas);
        for dim in [store_dim, asesor_dim, client_dim].into_iter().flatten() {
            registry.add(&dim, &doc_deltas);
        }

        // 7. Upsert das projeções, chaveado pelo id externo.
        let projection = build_projection(doc, client_ref);

        match self.orders_repo.find_order_id_by_contifico(&doc.id).await? {
            Some(order_id) => {
                batch
                    .stage(StagedWrite::UpdateOrder {
                        order_id,
                        projection: projection.clone(),
                    })
                    .await?;
            }
            None if !products_list.is_empty() => {
                let order_number = self.orders_repo.next_order_number().await?;
                batch
                    .stage(StagedWrite::CreateOrder(NewOrder {
                        projection: projection.clone(),
                        products_list,
                        order_number,
                    }))
                    .await?;
            }
            None => {}
        }

        match self
            .orders_repo
            .find_servicio_id_by_contifico(&doc.id)
            .await?
        {
            Some(servicio_id) => {
                batch
                    .stage(StagedWrite::UpdateServicioFacturado {
                        servicio_id,
                        projection,
                    })
                    .await?;
            }
            None if !service_list.is_empty() => {
                batch
                    .stage(StagedWrite::CreateServicioFacturado(NewServicioFacturado {
                        projection,
                        service_list,
                    }))
                    .await?;
            }
            None => {}
        }

        Ok(())
    }

    // ---
    // Varredura do catálogo local → Contifico
    // ---

    /// Completa no Contifico os cadastros locais que ainda não têm
    /// referência cruzada (id_contifico): pessoas, categorias, serviços e
    /// produtos. Falha de um registro não derruba a varredura.
    pub async fn sincronizar_catalogo(&self) -> Result<String, AppError> {
        let mut batch = BatchWriter::new(self.pool.clone());
        let mut updates = 0usize;

        tracing::info!("Iniciando varredura de cadastros para o Contifico");

        let users = self.users_repo.list_all().await?;
        if users.is_empty() {
            tracing::info!("Nenhum usuário na coleção users");
        }
        for user in users {
            batch
                .stage(StagedWrite::SetRegCompRrss {
                    user_id: user.id,
                    valor: user.registro_completo(),
                })
                .await?;
            updates += 1;

            if user.id_contifico.is_some() {
                continue;
            }
            let payload = PersonaPayload {
                tipo: "N".to_string(),
                cedula: user.cedula.clone(),
                razon_social: user.display_name.clone(),
                telefonos: user.telefono.clone(),
                email: user.email.clone(),
                direccion: user.direccion.clone(),
                es_cliente: true,
                es_empleado: user.rol() != "Cliente" && user.rol() != "Asesor",
                es_vendedor: user.rol() == "Asesor",
                es_proveedor: false,
            };
            match self.contifico.crear_persona(&payload).await {
                Ok(id) => {
                    batch
                        .stage(StagedWrite::SetIdContifico {
                            table: CatalogTable::Users,
                            record_id: user.id,
                            id_contifico: id,
                        })
                        .await?;
                    updates += 1;
                }
                // Pessoa já cadastrada: o Contifico devolve o id existente
                // no corpo do erro, e ele serve do mesmo jeito.
                Err(AppError::ExternalApi {
                    external_id: Some(id),
                    ..
                }) => {
                    batch
                        .stage(StagedWrite::SetIdContifico {
                            table: CatalogTable::Users,
                            record_id: user.id,
                            id_contifico: id,
                        })
                        .await?;
                    updates += 1;
                }
                Err(err) => {
                    tracing::error!(
                        "Falha ao criar pessoa no Contifico para o usuário {}: {}",
                        user.id,
                        err
                    );
                }
            }
        }

        let categorias = self.catalog_repo.list_categorias_servicios().await?;
        self.sweep_categorias(&mut batch, categorias, CatalogTable::CategoriasServicios, "SERV", &mut updates)
            .await?;
        let categorias = self.catalog_repo.list_categorias_productos().await?;
        self.sweep_categorias(&mut batch, categorias, CatalogTable::CategoriasProductos, "PROD", &mut updates)
            .await?;

        let servicios = self.catalog_repo.list_servicios().await?;
        for servicio in servicios {
            if servicio.id_contifico.is_some() {
                continue;
            }
            let categoria_id = match servicio.ref_categoria {
                Some(id) => self
                    .catalog_repo
                    .get_categoria_servicio(id)
                    .await?
                    .and_then(|c| c.id_contifico),
                None => None,
            };
            let payload = ProductoPayload {
                tipo: "SER".to_string(),
                nombre: servicio.nombre.clone(),
                descripcion: servicio.descripcion.clone().unwrap_or_default(),
                categoria_id,
                minimo: 0,
                pvp1: servicio.precio,
                estado: "A".to_string(),
                codigo: servicio.sku.clone(),
            };
            self.sweep_articulo(&mut batch, CatalogTable::Servicios, servicio.id, &payload, &mut updates)
                .await?;
        }

        let productos = self.catalog_repo.list_productos().await?;
        for producto in productos {
            if producto.id_contifico.is_some() {
                continue;
            }
            let categoria_id = match producto.ref_categoria {
                Some(id) => self
                    .catalog_repo
                    .get_categoria_producto(id)
                    .await?
                    .and_then(|c| c.id_contifico),
                None => None,
            };
            let payload = ProductoPayload {
                tipo: "PRO".to_string(),
                nombre: producto.nombre.clone(),
                descripcion: producto.descripcion.clone().unwrap_or_default(),
                categoria_id,
                minimo: 0,
                pvp1: producto.precio,
                estado: "A".to_string(),
                codigo: producto.sku.clone(),
            };
            self.sweep_articulo(&mut batch, CatalogTable::Productos, producto.id, &payload, &mut updates)
                .await?;
        }

        let ops = batch.finish().await?;
        tracing::info!(
            "Varredura concluída: {} registros atualizados ({} operações)",
            updates,
            ops
        );
        Ok(format!("Se actualizaron {} registros", updates))
    }

    async fn sweep_categorias(
        &self,
        batch: &mut BatchWriter,
        categorias: Vec<Categoria>,
        table: CatalogTable,
        tipo_producto: &str,
        updates: &mut usize,
    ) -> Result<(), AppError> {
        for categoria in categorias {
            if categoria.id_contifico.is_some() {
                continue;
            }
            let payload = CategoriaPayload {
                nombre: categoria.nombre.clone(),
                tipo_producto: tipo_producto.to_string(),
            };
            match self.contifico.crear_categoria(&payload).await {
                Ok(id)
                | Err(AppError::ExternalApi {
                    external_id: Some(id),
                    ..
                }) => {
                    batch
                        .stage(StagedWrite::SetIdContifico {
                            table,
                            record_id: categoria.id,
                            id_contifico: id,
                        })
                        .await?;
                    *updates += 1;
                }
                Err(err) => {
                    tracing::error!(
                        "Falha ao criar a categoria {} no Contifico: {}",
                        categoria.nombre,
                        err
                    );
                }
            }
        }
        Ok(())
    }

    async fn sweep_articulo(
        &self,
        batch: &mut BatchWriter,
        table: CatalogTable,
        record_id: Uuid,
        payload: &ProductoPayload,
        updates: &mut usize,
    ) -> Result<(), AppError> {
        match self.contifico.crear_producto(payload).await {
            Ok(id)
            | Err(AppError::ExternalApi {
                external_id: Some(id),
                ..
            }) => {
                batch
                    .stage(StagedWrite::SetIdContifico {
                        table,
                        record_id,
                        id_contifico: id,
                    })
                    .await?;
                *updates += 1;
            }
            Err(err) => {
                tracing::error!(
                    "Falha ao criar {} no Contifico: {}",
                    payload.nombre,
                    err
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn documento_d1() -> DocumentoContifico {
        serde_json::from_str(
            r#"{
                "id": "D1",
                "fecha_emision": "01/06/2025",
                "estado": "C",
                "documento": "001-002-000123",
                "subtotal_12": "17.86",
                "iva": 12,
                "total": 20,
                "detalles": [{"producto_id": "P1", "cantidad": 2, "precio": 10}],
                "cobros": [{"forma_cobro": "TC", "numero_comprobante": "X1", "fecha": "01/06/2025"}],
                "cliente": {"cedula": "0101"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn projecao_do_cenario_d1() {
        let doc = documento_d1();
        let client_ref = Uuid::new_v4();
        let projection = build_projection(&doc, Some(client_ref));

        assert_eq!(projection.id_contifico, "D1");
        assert_eq!(projection.order_status, OrderStatus::PagoPorValidar);
        assert_eq!(projection.payment_methods, Some(PaymentMethod::CreditCard));
        assert_eq!(projection.payment_transaction_id.as_deref(), Some("X1"));
        assert_eq!(
            projection.order_date,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(projection.total_value, Decimal::from(20));
        // tax = subtotal * iva / 100
        assert_eq!(
            projection.tax,
            Decimal::from_str("17.86").unwrap() * Decimal::from(12) / Decimal::from(100)
        );
        assert_eq!(projection.client_user_id, Some(client_ref));
    }

    #[test]
    fn projecao_sem_cobro_fica_sem_pagamento() {
        let mut doc = documento_d1();
        doc.cobros.clear();
        let projection = build_projection(&doc, None);

        assert!(projection.payment_methods.is_none());
        assert!(projection.payment_transaction_id.is_none());
        assert!(projection.payment_date.is_none());
    }

    #[test]
    fn iva_ausente_usa_fator_um() {
        let mut doc = documento_d1();
        doc.iva = None;
        let projection = build_projection(&doc, None);
        // 17.86 * 1 / 100
        assert_eq!(
            projection.tax,
            Decimal::from_str("17.86").unwrap() / Decimal::from(100)
        );
    }

    #[test]
    fn registro_acumula_deltas_de_varios_documentos() {
        let mut registry = BucketRegistry::new(2025, 6);
        let global_id = Uuid::new_v4();
        registry.register(StatDimension::Global, global_id);

        // Dois documentos, uma linha de produto cada (20 e 30).
        registry.add(
            &StatDimension::Global,
            &StatDeltas::product_line(Decimal::from(20), Decimal::from(2)),
        );
        registry.add(
            &StatDimension::Global,
            &StatDeltas::product_line(Decimal::from(30), Decimal::from(1)),
        );

        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        let (id, deltas) = &drained[0];
        assert_eq!(*id, global_id);
        assert_eq!(deltas.total_value, Decimal::from(50));
        assert_eq!(deltas.product_count, Decimal::from(3));
        assert_eq!(deltas.total_transactions, 2);
    }

    #[test]
    fn registro_ignora_dimensao_nao_resolvida() {
        let mut registry = BucketRegistry::new(2025, 6);
        // Loja sem cadastro local: add sem register é um no-op.
        registry.add(
            &StatDimension::Store(Uuid::new_v4()),
            &StatDeltas::product_line(Decimal::from(10), Decimal::ONE),
        );
        assert!(registry.drain().is_empty());
    }

    #[test]
    fn registro_nao_duplica_balde_por_dimensao() {
        let mut registry = BucketRegistry::new(2025, 6);
        let id = Uuid::new_v4();
        let dim = StatDimension::Product(Uuid::new_v4());
        registry.register(dim, id);
        // Um segundo register para a mesma dimensão não troca o id.
        registry.register(dim, Uuid::new_v4());
        assert_eq!(registry.bucket_id(&dim), Some(id));
        assert_eq!(registry.drain().len(), 1);
    }
}
