// Configuration module for the line-up drafter
// Supports YAML configuration files for GA parameters and runtime settings

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Files searched, in order, when no configuration path is given
pub const DEFAULT_PATHS: [&str; 3] = ["config.yaml", "config.yml", ".draft-config.yaml"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ga: GaSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Err(ConfigError::NotFound(path.to_string()));
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file if it exists, otherwise use defaults
    pub fn load_or_default(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::from_file(p).unwrap_or_else(|e| {
                warn!("{}; using default configuration", e);
                Self::default()
            }),
            None => {
                let (config, skipped) = Self::load_first(&DEFAULT_PATHS);
                for (path, e) in &skipped {
                    warn!(path = %path, "ignoring configuration: {}", e);
                }
                config
            }
        }
    }

    /// Load the first of `candidates` that exists and is valid.
    ///
    /// Existing files that fail to load are skipped and returned with their error; falls back
    /// to defaults when nothing loads.
    pub fn load_first(candidates: &[&str]) -> (Self, Vec<(String, ConfigError)>) {
        let mut skipped = Vec::new();
        for path in candidates {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    info!(path = %path, "loaded configuration");
                    return (config, skipped);
                }
                Err(e) => skipped.push((path.to_string(), e)),
            }
        }
        (Self::default(), skipped)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ga.validate()
    }
}

/// Genetic Algorithm settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaSettings {
    /// Number of generations to evolve
    #[serde(default = "default_generations")]
    pub generations: usize,

    /// Number of line-ups in the population
    #[serde(default = "default_population_size")]
    pub population_size: usize,

    /// Number of top line-ups bred into the next generation
    #[serde(default = "default_elitism_count")]
    pub elitism_count: usize,

    /// Probability of crossover between two offspring (0.0 - 1.0)
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,

    /// Probability of mutating an offspring pair (0.0 - 1.0)
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,

    /// Player swaps per mutated line-up
    #[serde(default = "default_mutations")]
    pub mutations: usize,

    /// Draws allowed to find a non-duplicate replacement before a mutation is skipped
    #[serde(default = "default_mutation_attempts")]
    pub mutation_attempts: usize,

    /// Random seed for reproducible drafts
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GaSettings {
    fn default() -> Self {
        GaSettings {
            generations: default_generations(),
            population_size: default_population_size(),
            elitism_count: default_elitism_count(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            mutations: default_mutations(),
            mutation_attempts: default_mutation_attempts(),
            seed: None,
        }
    }
}

impl GaSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generations == 0 {
            return Err(ConfigError::Invalid("ga.generations must be at least 1".into()));
        }
        if self.population_size < 2 {
            return Err(ConfigError::Invalid(
                "ga.population_size must be at least 2".into(),
            ));
        }
        if self.elitism_count == 0 || self.elitism_count > self.population_size {
            return Err(ConfigError::Invalid(format!(
                "ga.elitism_count must be between 1 and {}",
                self.population_size
            )));
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "ga.{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if self.mutation_attempts == 0 {
            return Err(ConfigError::Invalid(
                "ga.mutation_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_generations() -> usize { 200 }
fn default_population_size() -> usize { 500 }
fn default_elitism_count() -> usize { 10 }
fn default_crossover_rate() -> f64 { 0.5 }
fn default_mutation_rate() -> f64 { 0.5 }
fn default_mutations() -> usize { 3 }
fn default_mutation_attempts() -> usize { 32 }

/// Process-level settings used by the command line tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Worker threads for fitness evaluation (defaults to the number of CPUs)
    #[serde(default)]
    pub threads: Option<usize>,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Show a progress bar while drafting
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        RuntimeSettings {
            threads: None,
            log_level: default_log_level(),
            progress: default_progress(),
        }
    }
}

impl RuntimeSettings {
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

fn default_log_level() -> String { "draft=info".to_string() }
fn default_progress() -> bool { true }

/// Generate a sample configuration file
pub fn generate_sample_config() -> String {
    r#"# Line-up Draft Configuration
# All values shown are defaults - uncomment and modify as needed

# Genetic Algorithm settings
ga:
  # Number of generations to evolve
  generations: 200
  # Population size (number of line-ups evolved simultaneously)
  population_size: 500
  # Elitism (number of top line-ups bred into the next generation)
  elitism_count: 10
  # Crossover rate (probability of crossing over an offspring pair)
  crossover_rate: 0.5
  # Mutation rate (probability of mutating an offspring pair)
  mutation_rate: 0.5
  # Player swaps per mutated line-up
  mutations: 3
  # Draws allowed to find a non-duplicate replacement before skipping a mutation
  mutation_attempts: 32
  # Random seed, leave empty for a different draft every run
  # seed: 42

# Runtime settings
runtime:
  # Worker threads for fitness evaluation (defaults to the number of CPUs)
  # threads: 4
  # Log filter used when RUST_LOG is not set
  log_level: draft=info
  # Show a progress bar while drafting
  progress: true
"#
    .to_string()
}
