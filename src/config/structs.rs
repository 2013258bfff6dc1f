use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

/// 有效目标的重定向状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RedirectStatus {
    /// 302 Found
    #[default]
    Found,
    /// 301 Moved Permanently
    Permanent,
    /// 307 Temporary Redirect
    Temporary,
}

impl RedirectStatus {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Found => 302,
            Self::Permanent => 301,
            Self::Temporary => 307,
        }
    }
}

impl std::fmt::Display for RedirectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for RedirectStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "found" | "302" => Ok(Self::Found),
            "permanent" | "301" => Ok(Self::Permanent),
            "temporary" | "307" => Ok(Self::Temporary),
            _ => {
                let valid: Vec<String> = Self::iter().map(|v| v.as_ref().to_string()).collect();
                Err(format!(
                    "Invalid redirect status: '{}'. Valid: {}",
                    s,
                    valid.join(", ")
                ))
            }
        }
    }
}

/// 短码不存在时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotFoundBehavior {
    /// 返回 404
    #[default]
    NotFound,
    /// 重定向到 fallback URL
    Fallback,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量
/// - database: 数据库连接配置
/// - logging: 日志配置
/// - redirect: 扫码重定向策略
/// - scan_counter: 扫码计数刷盘策略
/// - registry: slug 生成策略
/// - auth: 身份令牌校验
/// - renderer: 外部二维码图片服务
/// - cors: 跨域配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub scan_counter: ScanCounterConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl StaticConfig {
    /// 从 config.toml 和环境变量加载配置
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    /// 从指定 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML > 默认值
    /// ENV 前缀：QR，分隔符：__
    /// 示例：QR__SERVER__PORT=9999
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("QR")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 单次操作超时（毫秒）
    #[serde(default = "default_database_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 重定向配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// 二维码中嵌入的公开地址，支持 `:slug` 占位符，否则直接拼接
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// 二维码停用或过期时的跳转地址
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    #[serde(default)]
    pub status: RedirectStatus,
    #[serde(default)]
    pub not_found: NotFoundBehavior,
    /// 是否把扫码请求上的 utm_* 参数透传给目标地址
    #[serde(default)]
    pub utm_passthrough: bool,
    /// 查询 slug 的超时（毫秒）
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

/// 扫码计数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCounterConfig {
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_max_scans_before_flush")]
    pub max_scans_before_flush: usize,
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,
}

/// slug 生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_slug_length")]
    pub slug_length: usize,
    #[serde(default = "default_max_slug_attempts")]
    pub max_slug_attempts: u32,
}

/// 身份令牌配置（由外部认证服务签发）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 共享密钥
    #[serde(default)]
    pub jwt_secret: String,
    /// 期望的 aud，留空则不校验
    #[serde(default = "default_jwt_audience")]
    pub audience: Option<String>,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
}

/// 外部二维码图片服务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_renderer_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_renderer_size")]
    pub size: u32,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
    #[serde(default)]
    pub allow_credentials: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "qrcodes.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout_ms() -> u64 {
    2000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_fallback_url() -> String {
    "https://example.com/".to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    1500
}

fn default_flush_interval_secs() -> u64 {
    5
}

fn default_max_scans_before_flush() -> usize {
    100
}

fn default_flush_timeout_ms() -> u64 {
    3000
}

fn default_slug_length() -> usize {
    8
}

fn default_max_slug_attempts() -> u32 {
    5
}

fn default_jwt_audience() -> Option<String> {
    Some("authenticated".to_string())
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_renderer_endpoint() -> String {
    "https://api.qrserver.com/v1/create-qr-code/".to_string()
}

fn default_renderer_size() -> u32 {
    300
}

fn default_cors_max_age() -> u64 {
    3600
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout_ms: default_database_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            fallback_url: default_fallback_url(),
            status: RedirectStatus::default(),
            not_found: NotFoundBehavior::default(),
            utm_passthrough: false,
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl Default for ScanCounterConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval_secs(),
            max_scans_before_flush: default_max_scans_before_flush(),
            flush_timeout_ms: default_flush_timeout_ms(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            slug_length: default_slug_length(),
            max_slug_attempts: default_max_slug_attempts(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            audience: default_jwt_audience(),
            api_prefix: default_api_prefix(),
            health_prefix: default_health_prefix(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            endpoint: default_renderer_endpoint(),
            size: default_renderer_size(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            max_age: default_cors_max_age(),
            allow_credentials: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_status_codes() {
        assert_eq!(RedirectStatus::Found.status_code(), 302);
        assert_eq!(RedirectStatus::Permanent.status_code(), 301);
        assert_eq!(RedirectStatus::Temporary.status_code(), 307);
    }

    #[test]
    fn test_redirect_status_from_str() {
        assert_eq!("301".parse::<RedirectStatus>(), Ok(RedirectStatus::Permanent));
        assert_eq!("FOUND".parse::<RedirectStatus>(), Ok(RedirectStatus::Found));
        let err = "teapot".parse::<RedirectStatus>().unwrap_err();
        assert!(err.contains("found, permanent, temporary"));
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[redirect]"));
        assert!(sample.contains("fallback_url"));

        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.registry.slug_length, 8);
        assert_eq!(parsed.redirect.status, RedirectStatus::Found);
        assert_eq!(parsed.redirect.not_found, NotFoundBehavior::NotFound);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [redirect]
            fallback_url = "https://shop.example/closed"
            status = "temporary"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.redirect.fallback_url, "https://shop.example/closed");
        assert_eq!(parsed.redirect.status, RedirectStatus::Temporary);
        assert_eq!(parsed.redirect.lookup_timeout_ms, 1500);
        assert_eq!(parsed.server.port, 8080);
    }
}
