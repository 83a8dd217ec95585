// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        BookingRepository, DashboardRepository, EmployeeRepository, InvoiceRepository, LeadRepository,
        PropertyRepository, RbacRepository, VisitRepository, WhatsAppRepository,
    },
    realtime::{NotificationDeduper, RealtimeHub},
    services::{
        auth::AuthService,
        booking_service::BookingService,
        dashboard_service::DashboardService,
        employee_service::EmployeeService,
        invoice_service::InvoiceService,
        lead_service::LeadService,
        property_service::PropertyService,
        rbac_service::RbacService,
        visit_service::VisitService,
        whatsapp_service::{GraphApiGateway, WhatsAppGateway, WhatsAppService},
    },
};

const DEFAULT_WHATSAPP_API_BASE: &str = "https://graph.facebook.com/v19.0";

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub jwt_ttl_days: i64,
    pub dedup_window: Duration,
    pub dedup_max_entries: usize,
    pub whatsapp_verify_token: Option<String>,
    pub whatsapp_access_token: Option<String>,
    pub whatsapp_phone_number_id: Option<String>,
    pub whatsapp_api_base: String,
    // Vazio: CORS permissivo, sem credenciais
    pub cors_origins: Vec<String>,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", key, raw, e)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: optional("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: optional("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            port: parsed("PORT", 3000)?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5)?,
            cookie_name: optional("COOKIE_NAME").unwrap_or_else(|| "token".to_string()),
            cookie_secure: parsed("COOKIE_SECURE", false)?,
            jwt_ttl_days: parsed("JWT_TTL_DAYS", 7)?,
            dedup_window: Duration::from_secs(parsed("NOTIFY_DEDUP_WINDOW_SECS", 10)?),
            dedup_max_entries: parsed("NOTIFY_DEDUP_MAX_ENTRIES", 1000)?,
            whatsapp_verify_token: optional("WHATSAPP_VERIFY_TOKEN"),
            whatsapp_access_token: optional("WHATSAPP_ACCESS_TOKEN"),
            whatsapp_phone_number_id: optional("WHATSAPP_PHONE_NUMBER_ID"),
            whatsapp_api_base: optional("WHATSAPP_API_BASE")
                .unwrap_or_else(|| DEFAULT_WHATSAPP_API_BASE.to_string()),
            cors_origins: optional("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub hub: RealtimeHub,
    pub auth_service: AuthService,
    pub employee_service: EmployeeService,
    pub rbac_service: RbacService,
    pub lead_service: LeadService,
    pub visit_service: VisitService,
    pub booking_service: BookingService,
    pub property_service: PropertyService,
    pub invoice_service: InvoiceService,
    pub whatsapp_service: WhatsAppService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let gateway = match (&config.whatsapp_phone_number_id, &config.whatsapp_access_token) {
            (Some(phone_number_id), Some(access_token)) => {
                let gateway = GraphApiGateway::new(
                    config.whatsapp_api_base.clone(),
                    phone_number_id.clone(),
                    access_token.clone(),
                )?;
                Some(Arc::new(gateway) as Arc<dyn WhatsAppGateway>)
            }
            _ => {
                tracing::warn!("WhatsApp sem credenciais: envio de mensagens desativado");
                None
            }
        };

        Self::from_parts(config, db_pool, gateway)
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_parts(
        config: Config,
        db_pool: PgPool,
        gateway: Option<Arc<dyn WhatsAppGateway>>,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);
        let hub = RealtimeHub::new(config.dedup_window, config.dedup_max_entries);

        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let visit_repo = VisitRepository::new(db_pool.clone());

        let auth_service = AuthService::new(employee_repo.clone(), config.jwt_secret.clone(), config.jwt_ttl_days);
        let employee_service = EmployeeService::new(employee_repo);
        let rbac_service = RbacService::new(RbacRepository::new(db_pool.clone()));
        let lead_service = LeadService::new(lead_repo.clone(), db_pool.clone(), hub.clone());
        let visit_service = VisitService::new(visit_repo.clone(), lead_repo.clone(), db_pool.clone(), hub.clone());
        let booking_service = BookingService::new(
            BookingRepository::new(db_pool.clone()),
            lead_repo,
            visit_repo,
            db_pool.clone(),
            hub.clone(),
        );
        let property_service = PropertyService::new(PropertyRepository::new(db_pool.clone()), db_pool.clone());
        let invoice_service = InvoiceService::new(InvoiceRepository::new(db_pool.clone()));
        let whatsapp_service = WhatsAppService::new(
            WhatsAppRepository::new(db_pool.clone()),
            db_pool.clone(),
            hub.clone(),
            NotificationDeduper::new(config.dedup_window, config.dedup_max_entries),
            gateway,
            config.whatsapp_verify_token.clone(),
        );
        let dashboard_service = DashboardService::new(DashboardRepository::new(db_pool.clone()));

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            hub,
            auth_service,
            employee_service,
            rbac_service,
            lead_service,
            visit_service,
            booking_service,
            property_service,
            invoice_service,
            whatsapp_service,
            dashboard_service,
        })
    }
}
