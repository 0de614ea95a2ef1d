use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Startup-time settings, resolved once. `db_uri` is the only required
/// value; everything else has a documented default matching the indexed
/// corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root location of the LanceDB database. Required; a missing value is
    /// a fatal configuration error.
    pub db_uri: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// Explicit model directory override; when unset the embedder resolves
    /// `models/<model id basename>` relative to the working directory.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

fn default_db_name() -> String {
    "kieu_bot".to_string()
}

fn default_table() -> String {
    "chunks".to_string()
}

fn default_model_id() -> String {
    "intfloat/multilingual-e5-base".to_string()
}

fn default_index_name() -> String {
    "vector_index".to_string()
}

impl Settings {
    /// Merge `config.toml`, the `RUST_ENV`-specific overlay, and `KIEU_*`
    /// environment variables, then extract the typed settings.
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("KIEU_"));

        Self::from_figment(&figment)
    }

    /// Extraction split out so tests can supply their own providers.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }

    /// Filesystem location of the named database under the configured URI.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.db_uri).join(&self.db_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_fill_everything_but_db_uri() {
        Jail::expect_with(|jail| {
            jail.set_env("KIEU_DB_URI", "/tmp/kieu-data");
            let settings = Settings::from_figment(&Figment::new().merge(Env::prefixed("KIEU_")))
                .expect("settings");
            assert_eq!(settings.db_name, "kieu_bot");
            assert_eq!(settings.table, "chunks");
            assert_eq!(settings.model_id, "intfloat/multilingual-e5-base");
            assert_eq!(settings.index_name, "vector_index");
            assert_eq!(settings.model_dir, None);
            assert_eq!(settings.database_path(), PathBuf::from("/tmp/kieu-data/kieu_bot"));
            Ok(())
        });
    }

    #[test]
    fn missing_db_uri_is_a_config_error() {
        let err = Settings::from_figment(&Figment::new()).expect_err("db_uri is required");
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }

    #[test]
    fn env_overrides_file_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    db_uri = "/srv/kieu"
                    table = "chunks_v1"
                "#,
            )?;
            jail.set_env("KIEU_TABLE", "chunks_v2");
            let figment = Figment::new()
                .merge(Toml::file("config.toml"))
                .merge(Env::prefixed("KIEU_"));
            let settings = Settings::from_figment(&figment).expect("settings");
            assert_eq!(settings.db_uri, "/srv/kieu");
            assert_eq!(settings.table, "chunks_v2");
            Ok(())
        });
    }
}
