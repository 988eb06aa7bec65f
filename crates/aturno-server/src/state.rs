//! Shared application state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use aturno_sheets::{ConfigError, SheetsClient, SheetsConfig, SheetsError};
use aturno_store::{ProjectSheetService, TaskSheetService};
use tracing::warn;

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment; decides whether error details reach clients
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    pub fn exposes_details(self) -> bool {
        self != Environment::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment '{other}' (expected development, test or production)"
            )),
        }
    }
}

// =============================================================================
// Services
// =============================================================================

/// The spreadsheet client and the entity services built on it
#[derive(Clone, Debug)]
pub struct Services {
    pub client: SheetsClient,
    pub tasks: TaskSheetService,
    pub projects: ProjectSheetService,
}

impl Services {
    pub fn new(client: SheetsClient) -> Self {
        Self {
            tasks: TaskSheetService::new(client.clone()),
            projects: ProjectSheetService::new(client.clone()),
            client,
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Whether the spreadsheet can be reached at all
#[derive(Clone, Debug)]
pub enum Backend {
    Ready(Services),
    /// Required variables were not set
    Missing(Vec<&'static str>),
    /// Configuration was present but unusable
    Failed(SheetsError),
}

impl Backend {
    /// Build the Google-backed services from a loaded configuration
    pub fn from_config(config: Result<SheetsConfig, ConfigError>) -> Self {
        match config {
            Ok(config) => match SheetsClient::from_config(&config) {
                Ok(client) => Backend::Ready(Services::new(client)),
                Err(err) => {
                    warn!(error = %err, "Spreadsheet client unavailable");
                    Backend::Failed(err)
                }
            },
            Err(ConfigError::Missing(missing)) => {
                warn!(missing = ?missing, "Spreadsheet credentials not configured");
                Backend::Missing(missing)
            }
            Err(err) => {
                warn!(error = %err, "Spreadsheet configuration rejected");
                Backend::Failed(err.into())
            }
        }
    }

    /// The services, or the configuration error explaining their absence
    pub fn services(&self) -> Result<&Services, SheetsError> {
        match self {
            Backend::Ready(services) => Ok(services),
            Backend::Missing(missing) => Err(ConfigError::Missing(missing.clone()).into()),
            Backend::Failed(err) => Err(err.clone()),
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

#[derive(Clone, Debug)]
pub struct AppState {
    pub backend: Arc<Backend>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(backend: Backend, environment: Environment) -> Self {
        Self {
            backend: Arc::new(backend),
            environment,
        }
    }

    /// State over an already-built client
    pub fn with_client(client: SheetsClient, environment: Environment) -> Self {
        Self::new(Backend::Ready(Services::new(client)), environment)
    }
}
