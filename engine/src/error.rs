use corelib::SymbolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("exchange `{exchange}`: {source}")]
    InvalidSymbol {
        exchange: String,
        #[source]
        source: SymbolError,
    },

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
