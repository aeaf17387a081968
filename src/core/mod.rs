// Public modules
pub mod convert;
pub mod dependencies;
pub mod error;
pub mod migrate;
pub mod settings;
pub mod usages;

// Re-export common types for convenience
pub use convert::{jsp_parser, FormattingConfig, Parser};
pub use error::{Error, ErrorCode, Result};
pub use migrate::{suggest_jte_file, Migration, Migrator};
pub use settings::ConverterSettings;
