pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5002;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_COLLECTION: &str = "plan_desarrollo_estatal";
pub const DEFAULT_TOP_K: usize = 10;
