/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use condo_api::{app::AppState, config::Config};
/// use condo_shared::vendors::Vendors;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let vendors = Vendors::from_config(&config.vendors);
/// let state = AppState::new(pool, config, vendors);
/// let app = condo_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use condo_shared::recognition::{IdentityDirectory, PgIdentityDirectory};
use condo_shared::vendors::Vendors;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted request body; image uploads are capped lower per field
pub const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// External service clients
    pub vendors: Vendors,

    /// Resolves face-recognition UUIDs to personas/empleados
    pub identities: Arc<dyn IdentityDirectory>,
}

impl AppState {
    /// Creates new application state backed by the database directory
    pub fn new(db: PgPool, config: Config, vendors: Vendors) -> Self {
        Self {
            identities: Arc::new(PgIdentityDirectory::new(db.clone())),
            db,
            config: Arc::new(config),
            vendors,
        }
    }

    /// Replaces the identity directory
    pub fn with_identities(mut self, identities: Arc<dyn IdentityDirectory>) -> Self {
        self.identities = identities;
        self
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health
/// └── /api/
///     ├── /personas, /cargos, /empleados
///     ├── /bloques, /unidades, /vehiculos, /mascotas
///     ├── /areas, /reservas
///     ├── /visitas, /objetos-perdidos, /incidentes
///     ├── /contratos, /expensas, /multas, /pagos
///     ├── /dashboard
///     ├── /dispositivos
///     └── /seguridad
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Body size limit
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let persona_routes = Router::new()
        .route(
            "/",
            get(routes::personas::list_personas).post(routes::personas::create_persona),
        )
        .route("/disponibles", get(routes::personas::list_disponibles))
        .route(
            "/reconocimiento-facial",
            post(routes::seguridad::reconocer_residente),
        )
        .route(
            "/:id",
            get(routes::personas::get_persona)
                .put(routes::personas::update_persona)
                .patch(routes::personas::update_persona)
                .delete(routes::personas::delete_persona),
        )
        .route("/:id/fotos", post(routes::personas::add_foto));

    let cargo_routes = Router::new()
        .route(
            "/",
            get(routes::empleados::list_cargos).post(routes::empleados::create_cargo),
        )
        .route(
            "/:id",
            get(routes::empleados::get_cargo)
                .put(routes::empleados::update_cargo)
                .patch(routes::empleados::update_cargo)
                .delete(routes::empleados::delete_cargo),
        );

    let empleado_routes = Router::new()
        .route(
            "/",
            get(routes::empleados::list_empleados).post(routes::empleados::create_empleado),
        )
        .route(
            "/:id",
            get(routes::empleados::get_empleado)
                .put(routes::empleados::update_empleado)
                .patch(routes::empleados::update_empleado)
                .delete(routes::empleados::delete_empleado),
        )
        .route("/:id/fotos", post(routes::empleados::add_foto));

    let bloque_routes = Router::new()
        .route(
            "/",
            get(routes::unidades::list_bloques).post(routes::unidades::create_bloque),
        )
        .route(
            "/:id",
            get(routes::unidades::get_bloque)
                .put(routes::unidades::update_bloque)
                .patch(routes::unidades::update_bloque)
                .delete(routes::unidades::delete_bloque),
        );

    let unidad_routes = Router::new()
        .route(
            "/",
            get(routes::unidades::list_unidades).post(routes::unidades::create_unidad),
        )
        .route(
            "/:id",
            get(routes::unidades::get_unidad)
                .put(routes::unidades::update_unidad)
                .patch(routes::unidades::update_unidad)
                .delete(routes::unidades::delete_unidad),
        );

    let vehiculo_routes = Router::new()
        .route(
            "/",
            get(routes::vehiculos::list_vehiculos).post(routes::vehiculos::create_vehiculo),
        )
        .route("/placa/:placa", get(routes::vehiculos::get_by_placa))
        .route(
            "/:id",
            get(routes::vehiculos::get_vehiculo)
                .put(routes::vehiculos::update_vehiculo)
                .patch(routes::vehiculos::update_vehiculo)
                .delete(routes::vehiculos::delete_vehiculo),
        );

    let mascota_routes = Router::new()
        .route(
            "/",
            get(routes::vehiculos::list_mascotas).post(routes::vehiculos::create_mascota),
        )
        .route(
            "/:id",
            get(routes::vehiculos::get_mascota)
                .put(routes::vehiculos::update_mascota)
                .patch(routes::vehiculos::update_mascota)
                .delete(routes::vehiculos::delete_mascota),
        );

    let area_routes = Router::new()
        .route(
            "/",
            get(routes::reservas::list_areas).post(routes::reservas::create_area),
        )
        .route(
            "/:id",
            get(routes::reservas::get_area)
                .put(routes::reservas::update_area)
                .patch(routes::reservas::update_area)
                .delete(routes::reservas::delete_area),
        );

    let reserva_routes = Router::new()
        .route(
            "/",
            get(routes::reservas::list_reservas).post(routes::reservas::create_reserva),
        )
        .route(
            "/:id",
            get(routes::reservas::get_reserva)
                .put(routes::reservas::update_reserva)
                .patch(routes::reservas::update_reserva)
                .delete(routes::reservas::delete_reserva),
        )
        .route("/:id/estado", post(routes::reservas::change_estado));

    let visita_routes = Router::new()
        .route(
            "/",
            get(routes::registros::list_visitas).post(routes::registros::create_visita),
        )
        .route(
            "/:id",
            get(routes::registros::get_visita)
                .put(routes::registros::update_visita)
                .patch(routes::registros::update_visita)
                .delete(routes::registros::delete_visita),
        )
        .route("/:id/finalizar", post(routes::registros::finalizar_visita));

    let objeto_routes = Router::new()
        .route(
            "/",
            get(routes::registros::list_objetos).post(routes::registros::create_objeto),
        )
        .route(
            "/:id",
            get(routes::registros::get_objeto)
                .put(routes::registros::update_objeto)
                .patch(routes::registros::update_objeto)
                .delete(routes::registros::delete_objeto),
        )
        .route("/:id/entregar", post(routes::registros::entregar_objeto));

    let incidente_routes = Router::new()
        .route(
            "/",
            get(routes::registros::list_incidentes).post(routes::registros::create_incidente),
        )
        .route(
            "/:id",
            get(routes::registros::get_incidente)
                .put(routes::registros::update_incidente)
                .patch(routes::registros::update_incidente)
                .delete(routes::registros::delete_incidente),
        );

    let contrato_routes = Router::new()
        .route(
            "/",
            get(routes::contratos::list_contratos).post(routes::contratos::create_contrato),
        )
        .route(
            "/:id",
            get(routes::contratos::get_contrato)
                .put(routes::contratos::update_contrato)
                .patch(routes::contratos::update_contrato)
                .delete(routes::contratos::delete_contrato),
        )
        .route("/:id/pdf", post(routes::contratos::generate_pdf));

    let expensa_routes = Router::new()
        .route(
            "/",
            get(routes::expensas::list_expensas).post(routes::expensas::create_expensa),
        )
        .route(
            "/:id",
            get(routes::expensas::get_expensa)
                .put(routes::expensas::update_expensa)
                .patch(routes::expensas::update_expensa)
                .delete(routes::expensas::delete_expensa),
        );

    let multa_routes = Router::new()
        .route(
            "/",
            get(routes::expensas::list_multas).post(routes::expensas::create_multa),
        )
        .route(
            "/:id",
            get(routes::expensas::get_multa)
                .put(routes::expensas::update_multa)
                .patch(routes::expensas::update_multa)
                .delete(routes::expensas::delete_multa),
        );

    let pago_routes = Router::new()
        .route("/intents", post(routes::pagos::create_intent))
        .route("/verificar", get(routes::pagos::verificar_pago));

    let dashboard_routes = Router::new()
        .route("/resumen", get(routes::dashboard::resumen))
        .route("/estado-expensas", get(routes::dashboard::estado_expensas))
        .route("/ingresos-mensuales", get(routes::dashboard::ingresos_mensuales))
        .route("/morosos", get(routes::dashboard::morosos))
        .route("/comparativo-anual", get(routes::dashboard::comparativo_anual));

    let dispositivo_routes = Router::new()
        .route(
            "/",
            get(routes::dispositivos::list_dispositivos)
                .post(routes::dispositivos::register_dispositivo),
        )
        .route("/:id", delete(routes::dispositivos::delete_dispositivo));

    let seguridad_routes = Router::new()
        .route("/alpr", post(routes::seguridad::alpr))
        .route("/lecturas", get(routes::seguridad::list_lecturas))
        .route("/reconocimiento", post(routes::seguridad::reconocer))
        .route("/enrolar", post(routes::seguridad::enrolar))
        .route("/enrolados", get(routes::seguridad::enrolados))
        .route(
            "/verificar-proveedor",
            get(routes::seguridad::verificar_proveedor),
        );

    let api_routes = Router::new()
        .nest("/personas", persona_routes)
        .nest("/cargos", cargo_routes)
        .nest("/empleados", empleado_routes)
        .nest("/bloques", bloque_routes)
        .nest("/unidades", unidad_routes)
        .nest("/vehiculos", vehiculo_routes)
        .nest("/mascotas", mascota_routes)
        .nest("/areas", area_routes)
        .nest("/reservas", reserva_routes)
        .nest("/visitas", visita_routes)
        .nest("/objetos-perdidos", objeto_routes)
        .nest("/incidentes", incidente_routes)
        .nest("/contratos", contrato_routes)
        .nest("/expensas", expensa_routes)
        .nest("/multas", multa_routes)
        .nest("/pagos", pago_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/dispositivos", dispositivo_routes)
        .nest("/seguridad", seguridad_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
