//! Application state shared by every handler

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::Client as S3Client;
use aws_sdk_sesv2::Client as SesClient;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{JwtConfig, JwtService, RateLimiter};
use crate::config::{Config, GatewayKind};
use crate::db::{
    AttendanceRepo, CheckclockRepo, EmployeeRepo, LeaveRequestRepo, LocationRepo, PgRepository,
    PositionRepo, RefreshTokenRepo, SubscriptionRepo, UserRepo, WorkScheduleRepo,
};
use crate::email::{EmailSender, SesEmailSender};
use crate::identity::{GoTrueClient, IdentityProvider};
use crate::payment::{MidtransGateway, PaymentGateway, XenditGateway};
use crate::services::{
    AttendanceService, AuthService, CheckclockService, EmployeeService, LeaveRequestService,
    LocationService, SubscriptionService, WorkScheduleService,
};
use crate::storage::{ObjectStorage, S3Storage};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every repository trait at once
pub trait Repository:
    UserRepo
    + RefreshTokenRepo
    + PositionRepo
    + EmployeeRepo
    + LeaveRequestRepo
    + AttendanceRepo
    + LocationRepo
    + WorkScheduleRepo
    + CheckclockRepo
    + SubscriptionRepo
    + 'static
{
}

impl<T> Repository for T where
    T: UserRepo
        + RefreshTokenRepo
        + PositionRepo
        + EmployeeRepo
        + LeaveRequestRepo
        + AttendanceRepo
        + LocationRepo
        + WorkScheduleRepo
        + CheckclockRepo
        + SubscriptionRepo
        + 'static
{
}

/// Outbound integrations
pub struct Integrations {
    pub storage: Arc<dyn ObjectStorage>,
    pub email: Arc<dyn EmailSender>,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: Arc<dyn PaymentGateway>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    pub jwt: JwtService,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
    /// Xendit callback verification key
    pub callback_token: String,
    pub auth: Arc<AuthService>,
    pub employees: Arc<EmployeeService>,
    pub leave_requests: Arc<LeaveRequestService>,
    pub work_schedules: Arc<WorkScheduleService>,
    pub locations: Arc<LocationService>,
    pub checkclock: Arc<CheckclockService>,
    pub attendances: Arc<AttendanceService>,
    pub subscriptions: Arc<SubscriptionService>,
}

impl AppState {
    /// Connect to PostgreSQL and AWS, run migrations and wire the services
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(100)
            .min_connections(10)
            .max_lifetime(Duration::from_secs(30 * 60))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let s3 = S3Client::new(&aws_config);
        let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
            let ses_config = aws_config
                .to_builder()
                .region(aws_config::Region::new(ses_region))
                .build();
            SesClient::new(&ses_config)
        } else {
            SesClient::new(&aws_config)
        };

        let gateway: Arc<dyn PaymentGateway> = match config.payment_gateway {
            GatewayKind::Xendit => Arc::new(XenditGateway::new(&config.xendit_secret_key)?),
            GatewayKind::Midtrans => Arc::new(MidtransGateway::new(
                &config.midtrans_server_key,
                config.midtrans_production,
            )?),
        };
        tracing::info!(gateway = gateway.name(), "Payment gateway configured");

        let integrations = Integrations {
            storage: Arc::new(S3Storage::new(s3, &config.storage_public_base_url)),
            email: Arc::new(SesEmailSender::new(ses, &config.ses_from_email)),
            identity: Arc::new(GoTrueClient::new(
                &config.identity_url,
                &config.identity_api_key,
            )?),
            gateway,
        };

        let repo = Arc::new(PgRepository::new(pool.clone()));
        Ok(Self::assemble(pool, repo, integrations, config))
    }

    /// Wire services over a repository and integrations
    pub fn assemble<R: Repository>(
        pool: PgPool,
        repo: Arc<R>,
        integrations: Integrations,
        config: &Config,
    ) -> Self {
        let jwt = JwtService::new(JwtConfig {
            secret: config.jwt_secret.clone(),
            access_ttl_minutes: config.jwt_access_ttl_minutes,
            refresh_ttl_days: config.jwt_refresh_ttl_days,
        });
        let Integrations {
            storage,
            email,
            identity,
            gateway,
        } = integrations;

        Self {
            pool,
            auth: Arc::new(AuthService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                repo.clone(),
                identity.clone(),
                email.clone(),
                jwt.clone(),
            )),
            employees: Arc::new(EmployeeService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                identity,
            )),
            leave_requests: Arc::new(LeaveRequestService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                storage,
                config.storage_bucket.clone(),
            )),
            work_schedules: Arc::new(WorkScheduleService::new(repo.clone(), repo.clone())),
            locations: Arc::new(LocationService::new(repo.clone())),
            checkclock: Arc::new(CheckclockService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
            )),
            attendances: Arc::new(AttendanceService::new(repo.clone())),
            subscriptions: Arc::new(SubscriptionService::new(
                repo.clone(),
                repo,
                gateway,
                email,
                &config.checkout_success_url,
                &config.checkout_failure_url,
            )),
            jwt,
            rate_limiter: RateLimiter::new(),
            callback_token: config.xendit_callback_token.clone(),
        }
    }
}
