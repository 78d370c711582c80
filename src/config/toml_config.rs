use crate::adapters::metadata_service::{MetadataIdentifierService, ServiceRegistry};
use crate::core::correcter::{CorrectionSettings, DEFAULT_FLAG_TYPE, DEFAULT_SERVICE};
use crate::core::grammar::{GrammarRegistry, DNB_URN_TYPE};
use crate::utils::error::{CorrecterError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const LOG_FORMATS: &[&str] = &["compact", "json"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrecterConfig {
    #[serde(default)]
    pub correction: CorrectionSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default = "default_services")]
    pub services: Vec<ServiceSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionSection {
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_flag_type")]
    pub flag_type: String,
    #[serde(default)]
    pub additional: String,
    #[serde(default)]
    pub fail_on_missing_object: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    pub name: String,
    pub identifier_type: String,
    /// Type attribute of the metadata identifier entry, e.g. `urn`.
    pub metadata_kind: String,
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

fn default_flag_type() -> String {
    DEFAULT_FLAG_TYPE.to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_services() -> Vec<ServiceSection> {
    vec![ServiceSection {
        name: DEFAULT_SERVICE.to_string(),
        identifier_type: DNB_URN_TYPE.to_string(),
        metadata_kind: "urn".to_string(),
    }]
}

impl Default for CorrectionSection {
    fn default() -> Self {
        Self {
            service: default_service(),
            flag_type: default_flag_type(),
            additional: String::new(),
            fail_on_missing_object: false,
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// 預設設定：DNBURN / dnbUrn / urn
impl Default for CorrecterConfig {
    fn default() -> Self {
        Self {
            correction: CorrectionSection::default(),
            storage: StorageSection::default(),
            logging: LoggingSection::default(),
            services: default_services(),
        }
    }
}

impl CorrecterConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CorrecterError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CorrecterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CorrecterError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn settings(&self, dry_run: bool) -> CorrectionSettings {
        CorrectionSettings {
            service: self.correction.service.clone(),
            flag_type: self.correction.flag_type.clone(),
            additional: self.correction.additional.clone(),
            fail_on_missing_object: self.correction.fail_on_missing_object,
            dry_run,
        }
    }

    pub fn service_registry(&self) -> ServiceRegistry {
        let mut registry = ServiceRegistry::new();
        for service in &self.services {
            registry.register(Arc::new(MetadataIdentifierService::new(
                service.name.clone(),
                service.identifier_type.clone(),
                service.metadata_kind.clone(),
            )));
        }
        registry
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        validation::validate_non_empty_string("correction.service", &self.correction.service)?;
        validation::validate_non_empty_string("correction.flag_type", &self.correction.flag_type)?;
        validation::validate_one_of(
            "logging.format",
            &self.logging.format.to_ascii_lowercase(),
            LOG_FORMATS,
        )?;
        validation::validate_one_of(
            "logging.level",
            &self.logging.level.to_ascii_lowercase(),
            LOG_LEVELS,
        )?;

        if self.services.is_empty() {
            return Err(CorrecterError::MissingConfigError {
                field: "services".to_string(),
            });
        }
        validation::validate_unique_names(
            "services",
            self.services.iter().map(|s| s.name.as_str()),
        )?;

        let grammars = GrammarRegistry::with_builtin();
        for service in &self.services {
            validation::validate_non_empty_string("services.name", &service.name)?;
            validation::validate_non_empty_string("services.metadata_kind", &service.metadata_kind)?;
            if !grammars.contains(&service.identifier_type) {
                return Err(CorrecterError::UnknownIdentifierType {
                    identifier_type: service.identifier_type.clone(),
                });
            }
        }

        if !self.services.iter().any(|s| s.name == self.correction.service) {
            return Err(CorrecterError::UnknownService {
                name: self.correction.service.clone(),
            });
        }

        Ok(())
    }
}

impl Validate for CorrecterConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
