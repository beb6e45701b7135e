// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{AutomationRepository, DeliveryStore, DropRepository, PgDeliveryStore, RealtorRepository, ReferenceRepository},
    services::{
        auth::AuthService,
        dashboard_service::DashboardService,
        drop_service::DropService,
        maps_service::MapsProxy,
        realtor_service::RealtorService,
        reference_service::ReferenceService,
        route_service::{GoogleRoutesClient, RouteSequencer, RoutingProvider},
    },
};

pub const DEFAULT_HOME_BASE: &str = "iHaul iMove, Colorado Springs, CO";
pub const DEFAULT_ROUTES_API_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";
pub const DEFAULT_MAPS_API_BASE_URL: &str = "https://maps.googleapis.com";

// Senha compartilhada: o hash pronto ou a senha em texto, que é convertida na partida
#[derive(Debug, Clone)]
pub enum PasswordSource {
    Hash(String),
    Plain(String),
}

// Configuração lida do ambiente
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub password: PasswordSource,
    pub session_secret: String,
    pub session_ttl_days: i64,
    pub cookie_secure: bool,
    pub maps_api_key: Option<String>,
    pub home_base_address: String,
    pub routes_api_url: String,
    pub maps_api_base_url: String,
    pub maps_timeout: Duration,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{} deve ser definida", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw.parse().with_context(|| format!("{} inválida: {}", name, raw)),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let password = match (optional("APP_PASSWORD_HASH"), optional("APP_PASSWORD")) {
            (Some(hash), _) => PasswordSource::Hash(hash),
            (None, Some(plain)) => PasswordSource::Plain(plain),
            (None, None) => anyhow::bail!("APP_PASSWORD_HASH ou APP_PASSWORD deve ser definida"),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            password,
            session_secret: required("SESSION_SECRET")?,
            session_ttl_days: parsed("SESSION_TTL_DAYS", 30)?,
            cookie_secure: parsed("COOKIE_SECURE", false)?,
            maps_api_key: optional("GOOGLE_MAPS_API_KEY"),
            home_base_address: optional("HOME_BASE_ADDRESS").unwrap_or_else(|| DEFAULT_HOME_BASE.to_string()),
            routes_api_url: optional("ROUTES_API_URL").unwrap_or_else(|| DEFAULT_ROUTES_API_URL.to_string()),
            maps_api_base_url: optional("MAPS_API_BASE_URL").unwrap_or_else(|| DEFAULT_MAPS_API_BASE_URL.to_string()),
            maps_timeout: Duration::from_secs(parsed("MAPS_TIMEOUT_SECS", 10)?),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
        })
    }

    /// Resolve o hash bcrypt da senha. A senha em texto não fica guardada.
    pub async fn password_hash(&self) -> anyhow::Result<String> {
        match &self.password {
            PasswordSource::Hash(hash) => Ok(hash.clone()),
            PasswordSource::Plain(plain) => {
                let plain = plain.clone();
                let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, bcrypt::DEFAULT_COST))
                    .await
                    .context("Falha na task de hash da senha")??;
                Ok(hash)
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub cookie_secure: bool,

    // Repositórios usados direto pelo health check
    pub drop_repo: DropRepository,
    pub realtor_repo: RealtorRepository,

    pub auth_service: AuthService,
    pub drop_service: DropService,
    pub realtor_service: RealtorService,
    pub dashboard_service: DashboardService,
    pub reference_service: ReferenceService,
    pub route_sequencer: RouteSequencer,
    pub maps_proxy: MapsProxy,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let password_hash = config.password_hash().await?;
        let store: Arc<dyn DeliveryStore> = Arc::new(PgDeliveryStore::new(db_pool.clone()));

        Self::from_parts(config, db_pool, store, password_hash)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_parts(
        config: &AppConfig,
        db_pool: PgPool,
        store: Arc<dyn DeliveryStore>,
        password_hash: String,
    ) -> anyhow::Result<Self> {
        let drop_repo = DropRepository::new(db_pool.clone());
        let realtor_repo = RealtorRepository::new(db_pool.clone());
        let reference_repo = ReferenceRepository::new(db_pool.clone());
        let automation_repo = AutomationRepository::new(db_pool.clone());

        let provider: Option<Arc<dyn RoutingProvider>> = match &config.maps_api_key {
            Some(key) => Some(Arc::new(GoogleRoutesClient::new(
                key.clone(),
                config.routes_api_url.clone(),
                config.maps_timeout,
            )?)),
            None => {
                tracing::warn!("⚠️ GOOGLE_MAPS_API_KEY ausente: rotas sem otimização e proxy de mapas desativado");
                None
            }
        };

        let maps_proxy = MapsProxy::new(
            config.maps_api_key.clone(),
            config.maps_api_base_url.clone(),
            config.home_base_address.clone(),
            config.maps_timeout,
        )?;

        Ok(Self {
            auth_service: AuthService::new(password_hash, config.session_secret.clone(), config.session_ttl_days),
            drop_service: DropService::new(store.clone()),
            realtor_service: RealtorService::new(realtor_repo.clone(), drop_repo.clone()),
            dashboard_service: DashboardService::new(store, reference_repo.clone()),
            reference_service: ReferenceService::new(reference_repo, automation_repo),
            route_sequencer: RouteSequencer::new(provider, config.home_base_address.clone()),
            maps_proxy,
            cookie_secure: config.cookie_secure,
            drop_repo,
            realtor_repo,
            db_pool,
        })
    }
}
