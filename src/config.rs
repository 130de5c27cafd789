use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub whatsapp: WhatsAppConfig,
    pub paystack: PaystackConfig,
    pub conversation: ConversationConfig,
    pub workers: WorkerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where sessions, catalog and orders live.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// YAML catalog loaded into the in-memory backend at startup.
    pub catalog_seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub user: String,
    #[serde(skip_serializing, default = "empty_secret")]
    pub password: SecretString,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhatsAppConfig {
    pub api_base_url: String,
    pub phone_number_id: String,
    #[serde(skip_serializing, default = "empty_secret")]
    pub access_token: SecretString,
    /// Token echoed back during the webhook subscription handshake.
    #[serde(skip_serializing, default = "empty_secret")]
    pub verify_token: SecretString,
    /// When non-empty, inbound deliveries must carry a valid `X-Hub-Signature-256`.
    #[serde(skip_serializing, default = "empty_secret")]
    pub app_secret: SecretString,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaystackConfig {
    pub base_url: String,
    #[serde(skip_serializing, default = "empty_secret")]
    pub secret_key: SecretString,
    pub callback_url: String,
    pub currency: String,
    /// Paystack requires an email; customers are addressed as `<digits>@<domain>`.
    pub customer_email_domain: String,
    pub timeout_secs: u64,
}

/// How a completed address turns into an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckoutMode {
    /// Create a pending payment and wait for gateway confirmation.
    #[default]
    Gateway,
    /// Create the order immediately, paid on delivery.
    Cash,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversationConfig {
    /// Upper bound for a single add-to-cart quantity.
    pub max_quantity_per_add: u32,
    /// Optional bound for a merged cart line. Unbounded when absent.
    pub max_line_quantity: Option<u32>,
    pub min_address_length: usize,
    pub search_result_limit: usize,
    pub checkout_mode: CheckoutMode,
    /// Flat delivery fee in minor units, added to every order total.
    pub delivery_fee: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    pub session_idle_hours: i64,
    pub payment_window_minutes: i64,
    /// A `processing` claim older than this is considered abandoned.
    pub claim_timeout_secs: i64,
    pub sweep_interval_secs: u64,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            // e.g., FOODBOT__PAYSTACK__SECRET_KEY="sk_live_..."
            .add_source(
                config::Environment::with_prefix("FOODBOT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    /// Constructs the database connection string.
    pub fn connection_string(&self) -> SecretString {
        SecretString::from(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database
        ))
    }
}

impl WhatsAppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn requires_signature(&self) -> bool {
        !self.app_secret.expose_secret().is_empty()
    }
}

impl PaystackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            catalog_seed_path: Some("seed/catalog.yaml".to_string()),
        }
    }
}

// Default values for the database configuration
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: "postgres".to_string(),
            password: "password".to_string().into(),
            host: "localhost".to_string(),
            port: 5432,
            database: "foodbot".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://graph.facebook.com/v18.0".to_string(),
            phone_number_id: String::new(),
            access_token: empty_secret(),
            verify_token: empty_secret(),
            app_secret: empty_secret(),
            timeout_secs: 10,
        }
    }
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: empty_secret(),
            callback_url: "http://localhost:3000/api/v1/payments/paystack/callback".to_string(),
            currency: "NGN".to_string(),
            customer_email_domain: "customers.foodbot.local".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_quantity_per_add: 10,
            max_line_quantity: None,
            min_address_length: 10,
            search_result_limit: 10,
            checkout_mode: CheckoutMode::Gateway,
            delivery_fee: 0,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            session_idle_hours: 24,
            payment_window_minutes: 30,
            claim_timeout_secs: 60,
            sweep_interval_secs: 300,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets are skipped by #[serde(skip_serializing)]
        match serde_json::to_string_pretty(&self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "Error serializing config"),
        }
    }
}
