use super::parsing::{
    env_flag, env_optional, env_or_default, is_supported_image_extension, parse_bool,
    parse_cors_origins, parse_environment, parse_string_list, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, RedisSettings,
    RuntimeSettings, S3Settings, SecuritySettings, ServerHost, ServerPort, ServerSettings,
    Settings, StorageSettings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("EXAMHUB_HOST", "0.0.0.0");
        let port = env_or_default("EXAMHUB_PORT", "8000");

        let environment =
            parse_environment(env_optional("EXAMHUB_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("EXAMHUB_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "ExamHub API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None if strict_config => return Err(ConfigError::MissingSecret("SECRET_KEY")),
            None => load_or_create_secret_key(),
        };

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "1440"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "examhub");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "examhub");
        let database_url = env_optional("DATABASE_URL");
        let max_connections = parse_u32(
            "DATABASE_MAX_CONNECTIONS",
            env_or_default("DATABASE_MAX_CONNECTIONS", "20"),
        )?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "5"))?;
        let allowed_image_extensions = parse_string_list(
            env_optional("ALLOWED_IMAGE_EXTENSIONS"),
            &["jpg", "jpeg", "png", "webp"],
        );

        let s3_endpoint = env_or_default("S3_ENDPOINT", "http://localhost:9000");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "examhub");
        let s3_region = env_or_default("S3_REGION", "us-east-1");

        let first_superuser_email = env_or_default("FIRST_SUPERUSER_EMAIL", "admin@examhub.local");
        let first_superuser_password = env_or_default("FIRST_SUPERUSER_PASSWORD", "");

        let log_level = env_or_default("LOG_LEVEL", "info");
        let json = env_flag("LOG_JSON");
        let prometheus_enabled = env_flag("PROMETHEUS_ENABLED");

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            storage: StorageSettings { max_upload_size_mb, allowed_image_extensions },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            admin: AdminSettings { first_superuser_email, first_superuser_password },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub(crate) fn max_upload_bytes(&self) -> usize {
        (self.storage.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.allowed_image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_IMAGE_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        for extension in &self.storage.allowed_image_extensions {
            if !is_supported_image_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_IMAGE_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.security.algorithm != "HS256" {
            return Err(ConfigError::InvalidValue {
                field: "ALGORITHM",
                value: self.security.algorithm.clone(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if !self.s3.is_configured() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }
        if self.admin.first_superuser_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD"));
        }

        Ok(())
    }
}
