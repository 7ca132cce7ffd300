//! Fleet configuration: the ordered list of services under aggregation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bump::Tier;
use crate::error::{BossError, Result};

/// One service under fleet versioning. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Service name, the key used in the persisted manifest.
    pub name: String,
    /// Repository identifier, `owner/name` form.
    pub repo: String,
    /// Importance tier (1, 2 or 3).
    pub tier: Tier,
}

/// Ordered fleet configuration.
///
/// Order matters: services are evaluated sequentially in list order, and
/// both the priority-override "first hit wins" rule and justification text
/// depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetConfig {
    pub services: Vec<ServiceSpec>,
}

impl FleetConfig {
    /// Load and validate configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            BossError::InvalidConfig(format!(
                "cannot read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let config: FleetConfig = serde_json::from_str(&raw)
            .map_err(|e| BossError::InvalidConfig(format!("cannot parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot evaluate meaningfully.
    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(BossError::InvalidConfig(
                "services list is empty".to_string(),
            ));
        }
        for service in &self.services {
            if service.name.is_empty() {
                return Err(BossError::InvalidConfig(
                    "service name must not be empty".to_string(),
                ));
            }
            if !service.repo.contains('/') {
                return Err(BossError::InvalidConfig(format!(
                    "repo for '{}' must be owner/name, got '{}'",
                    service.name, service.repo
                )));
            }
        }
        Ok(())
    }
}
