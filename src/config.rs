// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    clients::ContificoClient,
    services::{ContificoService, SyncService},
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub sync_service: SyncService,
    pub contifico_service: ContificoService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let contifico_uri = env::var("CONTIFICO_URI").expect("CONTIFICO_URI deve ser definida");
        let contifico_token =
            env::var("CONTIFICO_AUTH_TOKEN").expect("CONTIFICO_AUTH_TOKEN deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let contifico = ContificoClient::new(contifico_uri, contifico_token);
        let sync_service = SyncService::new(db_pool.clone(), contifico.clone());
        let contifico_service = ContificoService::new(contifico);

        Ok(Self {
            db_pool,
            sync_service,
            contifico_service,
        })
    }
}
