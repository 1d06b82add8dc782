use std::sync::Arc;

use anyhow::Context;
use auth::JwtHandler;
use auth::TokenService;
use school_service::config::Config;
use school_service::domain::user::models::CreateAdminCommand;
use school_service::domain::user::models::EmailAddress;
use school_service::domain::user::models::FullName;
use school_service::domain::user::ports::AuthServicePort;
use school_service::domain::user::ports::EmailSender;
use school_service::domain::user::ports::UserDirectory;
use school_service::domain::user::service::AuthService;
use school_service::inbound::http::router::create_router;
use school_service::inbound::http::router::RouterOptions;
use school_service::outbound::email::LoggingEmailSender;
use school_service::outbound::email::SmtpEmailSender;
use school_service::outbound::repositories::InMemoryUserDirectory;
use school_service::outbound::repositories::PostgresUserDirectory;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "school-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        persistent = config.database.url.is_some(),
        jwt_algorithm = %config.jwt.algorithm,
        access_token_expire_minutes = config.jwt.access_token_expire_minutes,
        open_student_registration = config.auth.open_student_registration,
        "Configuration loaded"
    );

    match config.database.url.clone() {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            run(config, Arc::new(PostgresUserDirectory::new(pg_pool))).await
        }
        None => {
            tracing::warn!("No database url configured, users are kept in memory");
            run(config, Arc::new(InMemoryUserDirectory::new())).await
        }
    }
}

async fn run<UD: UserDirectory>(config: Config, directory: Arc<UD>) -> Result<(), anyhow::Error> {
    match config.email.smtp_host.clone() {
        Some(host) => {
            let email_sender = SmtpEmailSender::from_config(&config.email)
                .context("Failed to configure SMTP transport")?;
            tracing::info!(
                smtp_host = %host,
                smtp_port = config.email.smtp_port,
                "SMTP email sender configured"
            );
            serve(config, directory, Arc::new(email_sender)).await
        }
        None => {
            tracing::warn!("No SMTP host configured, password reset tokens are only logged");
            let email_sender = LoggingEmailSender::new(config.email.from_address.clone());
            serve(config, directory, Arc::new(email_sender)).await
        }
    }
}

async fn serve<UD, ES>(
    config: Config,
    directory: Arc<UD>,
    email_sender: Arc<ES>,
) -> Result<(), anyhow::Error>
where
    UD: UserDirectory,
    ES: EmailSender,
{
    let jwt_handler = JwtHandler::with_algorithm(config.jwt.secret.as_bytes(), &config.jwt.algorithm)?;
    let tokens = Arc::new(TokenService::new(
        jwt_handler,
        chrono::Duration::minutes(config.jwt.access_token_expire_minutes),
    ));
    let auth_service = Arc::new(
        AuthService::new(directory, email_sender, tokens).with_reset_token_ttl(
            chrono::Duration::minutes(config.auth.reset_token_ttl_minutes),
        ),
    );

    if let Some(admin) = &config.bootstrap_admin {
        let command = CreateAdminCommand {
            email: EmailAddress::new(admin.email.clone())?,
            full_name: FullName::new(admin.full_name.clone())?,
            mobile: admin.mobile.clone(),
            password: admin.password.clone(),
        };
        let created = auth_service
            .ensure_default_admin(command)
            .await
            .context("Failed to bootstrap admin account")?;
        tracing::info!(email = %admin.email, created, "Bootstrap admin checked");
    }

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        RouterOptions {
            open_student_registration: config.auth.open_student_registration,
        },
    );

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
