use std::{fs, io, net::SocketAddr, sync::OnceLock, time};

use application::{api, args::Action, Args, Config};
use axum::{extract::MatchedPath, Extension};
use axum_client_ip::InsecureClientIp;
use service::{
    command,
    domain::user,
    infra::{postgres, Postgres},
    Command as _, Service,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{self, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

static LOG_FILE: OnceLock<fs::File> = OnceLock::new();

postgres::embed_migrations!("../migrations");

/// Writer appending to the [`LOG_FILE`], once it's opened.
struct LogFile;

impl io::Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LOG_FILE
            .get()
            .map_or(Ok(buf.len()), |mut f| io::Write::write(&mut f, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        LOG_FILE.get().map_or(Ok(()), |mut f| io::Write::flush(&mut f))
    }
}

fn is_enabled(level: log::Level) -> bool {
    LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO) >= level
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && is_enabled(*meta.level())
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && is_enabled(*meta.level())
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_thread_names(true)
                .with_writer(|| LogFile)
                .with_filter(filter_fn(|meta| {
                    LOG_FILE.get().is_some()
                        && (meta.is_span() || is_enabled(*meta.level()))
                })),
        )
        .init();

    _ = start().await;
}

async fn start() -> Result<(), ()> {
    let Args {
        config,
        command: action,
    } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    if let Some(path) = log.file {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                log::error!(
                    "failed to open `{}` log file: {e}",
                    path.display(),
                );
            })?;
        LOG_FILE
            .set(file)
            .unwrap_or_else(|_| unreachable!("first initialization"));
    }

    let service_config: service::Config = service.try_into().map_err(|e| {
        log::error!("invalid `service` config: {e}");
    })?;

    let postgres_config = postgres.into();
    let mut postgres = Postgres::new(&postgres_config).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let service = Service::new(service_config, postgres);

    match action {
        Some(action) => run(action, &service).await,
        None => serve(service, server).await,
    }
}

async fn run(
    action: Action,
    service: &application::Service,
) -> Result<(), ()> {
    match action {
        Action::CreateSuperadmin {
            first_name,
            last_name,
            email,
            password,
        } => {
            let first_name = user::Name::new(first_name).ok_or_else(|| {
                log::error!("invalid first name");
            })?;
            let last_name = user::Name::new(last_name).ok_or_else(|| {
                log::error!("invalid last name");
            })?;
            let email = user::Email::new(email).ok_or_else(|| {
                log::error!("invalid email");
            })?;
            let password = user::Password::new(password).ok_or_else(|| {
                log::error!(
                    "password must be {}..={} characters long",
                    user::Password::MIN_LEN,
                    user::Password::MAX_LEN,
                );
            })?;

            let user = service
                .execute(command::CreateUser {
                    first_name,
                    last_name,
                    email,
                    password: secrecy::SecretBox::init_with(move || password),
                    role: user::Role::Superadmin,
                    status: user::Status::Active,
                    profile_image: None,
                })
                .await
                .map_err(|e| {
                    log::error!("failed to create superadmin: {e}");
                })?;

            log::info!(
                user.id = %user.id,
                "superadmin `{}` created",
                user.email,
            );
            Ok(())
        }
    }
}

async fn serve(
    service: application::Service,
    server: application::config::Server,
) -> Result<(), ()> {
    let cors = CorsLayer::new()
        .allow_methods([
            http::Method::DELETE,
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
            http::Method::PUT,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ]);
    let cors = if server.cors.origins.iter().any(|o| o == "*") {
        cors.allow_origin(cors::Any)
    } else {
        let origins = server
            .cors
            .origins
            .iter()
            .map(|origin| {
                origin.parse::<http::header::HeaderValue>().map_err(|e| {
                    log::error!("`{origin}` is not correct CORS origin: {e}");
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        cors.allow_origin(cors::AllowOrigin::list(origins))
    };

    let app = api::router()
        .layer(Extension(service))
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            server.request_timeout,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    tracing::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions()
                        )
                            .map(|ip| ip.0.to_string())
                            .ok(),
                        http.flavor = ?r.version(),
                        http.host = r.uri().host(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.user_agent = r
                            .headers()
                            .get(http::header::USER_AGENT)
                            .and_then(|h| h.to_str().ok()),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &tracing::Span| {
                        _ = span.record(
                            "http.status_code",
                            tracing::field::display(r.status().as_u16()),
                        );

                        if r.status().is_server_error() {
                            tracing::error!(
                                duration = format!("{}ms", dur.as_millis()),
                            );
                        } else {
                            tracing::info!(
                                duration = format!("{}ms", dur.as_millis()),
                            );
                        }
                    },
                ),
        );

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!("listening on `{}:{}`", server.host, server.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| log::error!("webserver failed: {e}"))
}
