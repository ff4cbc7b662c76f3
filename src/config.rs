use eyre::{Context, Result};
use parsegen::llm::{ClientConfig, Provider};
use parsegen::runner::{LoopConfig, MAX_ATTEMPTS};
use parsegen::sandbox::{RunnerShim, SubprocessConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub sandbox: SandboxConfig,
    pub paths: PathsConfig,
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,
    /// Provider default when unset
    pub model: Option<String>,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            max_tokens: 8192,
            timeout_ms: 300000,
        }
    }
}

impl LlmConfig {
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_provider(self.provider);
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        config.max_tokens = self.max_tokens;
        config.timeout = Duration::from_millis(self.timeout_ms);
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub include_feedback: bool,
    pub retry_backoff_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            include_feedback: false,
            retry_backoff_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub program: String,
    pub timeout_ms: u64,
    pub pass_env: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            timeout_ms: 120000,
            pass_env: Vec::new(),
        }
    }
}

impl SandboxConfig {
    pub fn subprocess_config(&self, namespace: &str) -> SubprocessConfig {
        self.pass_env.iter().fold(
            SubprocessConfig::new(RunnerShim::python(&self.program))
                .timeout(Duration::from_millis(self.timeout_ms))
                .namespace(namespace),
            |config, name| config.pass_env(name),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub root: PathBuf,
    pub document_ext: String,
    pub source_ext: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            document_ext: "pdf".to_string(),
            source_ext: "py".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub template_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
            sandbox: SandboxConfig::default(),
            paths: PathsConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.generation.max_attempts == 0 {
            eyre::bail!("generation.max_attempts must be at least 1");
        }
        if self.sandbox.timeout_ms == 0 {
            eyre::bail!("sandbox.timeout_ms must be greater than 0");
        }
        if self.paths.document_ext.is_empty() || self.paths.source_ext.is_empty() {
            eyre::bail!("paths.document_ext and paths.source_ext must not be empty");
        }
        Ok(())
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            max_attempts: self.generation.max_attempts,
            include_feedback: self.generation.include_feedback,
            retry_backoff: Duration::from_millis(self.generation.retry_backoff_ms),
            document_ext: self.paths.document_ext.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.llm.provider, Provider::Gemini);
        assert_eq!(config.generation.max_attempts, 3);
        assert!(!config.generation.include_feedback);
        assert_eq!(config.sandbox.program, "python3");
        assert_eq!(config.sandbox.timeout_ms, 120000);
        assert_eq!(config.paths.root, PathBuf::from("."));
        assert!(config.prompt.template_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "llm:\n  provider: anthropic\ngeneration:\n  include_feedback: true\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.provider, Provider::Anthropic);
        assert_eq!(config.llm.max_tokens, 8192);
        assert!(config.generation.include_feedback);
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.sandbox.program, "python3");
    }

    #[test]
    fn test_client_config_uses_provider_default_model() {
        let mut llm = LlmConfig::default();
        assert_eq!(llm.client_config().model, "gemini-2.5-pro");

        llm.provider = Provider::Anthropic;
        llm.timeout_ms = 1000;
        let client = llm.client_config();
        assert_eq!(client.model, "claude-sonnet-4-20250514");
        assert_eq!(client.timeout, Duration::from_secs(1));

        llm.model = Some("gemini-2.5-flash".to_string());
        assert_eq!(llm.client_config().model, "gemini-2.5-flash");
    }

    #[test]
    fn test_subprocess_config() {
        let sandbox = SandboxConfig {
            program: "python3.12".to_string(),
            timeout_ms: 500,
            pass_env: vec!["PYTHONPATH".to_string(), "VIRTUAL_ENV".to_string()],
        };
        let config = sandbox.subprocess_config("icici");
        assert_eq!(config.shim.program, "python3.12");
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.pass_env, vec!["PYTHONPATH", "VIRTUAL_ENV"]);
        assert_eq!(config.namespace, "icici");
    }

    #[test]
    fn test_loop_config() {
        let mut config = Config::default();
        config.generation.retry_backoff_ms = 250;
        config.paths.document_ext = "pdf".to_string();
        let loop_config = config.loop_config();
        assert_eq!(loop_config.max_attempts, 3);
        assert_eq!(loop_config.retry_backoff, Duration::from_millis(250));
        assert_eq!(loop_config.document_ext, "pdf");
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.generation.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parsegen.yml");
        fs::write(&path, "log_level: debug\nsandbox:\n  timeout_ms: 5000\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.sandbox.timeout_ms, 5000);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/parsegen.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parsegen.yml");
        fs::write(&path, "generation:\n  max_attempts: 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
