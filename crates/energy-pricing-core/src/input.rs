//! Calculation request types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AgentId, BotId, PackageId};

/// The blockchain resource being rented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Energy, measured in energy units.
    Energy,
    /// Bandwidth, measured in bytes.
    Bandwidth,
}

impl ResourceType {
    /// Get the resource name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Bandwidth => "bandwidth",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "energy" => Ok(Self::Energy),
            "bandwidth" => Ok(Self::Bandwidth),
            other => Err(format!("unknown resource type: {other}")),
        }
    }
}

/// Customer tier, used to gate absolute spend limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserLevel {
    /// Default customer.
    #[default]
    Regular,
    /// Paying subscriber.
    Premium,
    /// Hand-managed large customer.
    Vip,
}

impl UserLevel {
    /// Get the level name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Premium => "premium",
            Self::Vip => "vip",
        }
    }
}

/// One pricing request.
///
/// Constructed per request by the caller and never persisted; only the
/// derived breakdown ends up in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Which resource is being priced.
    pub resource_type: ResourceType,

    /// Catalog package, if the purchase is for a package.
    #[serde(default)]
    pub package_id: Option<PackageId>,

    /// Number of units (transactions) purchased.
    pub quantity: u64,

    /// Resource amount to price (energy units or bytes).
    pub amount: f64,

    /// Bot the purchase came through.
    #[serde(default)]
    pub bot_id: Option<BotId>,

    /// Reseller agent the purchase came through.
    #[serde(default)]
    pub agent_id: Option<AgentId>,

    /// Customer tier for spend limits.
    #[serde(default)]
    pub user_level: Option<UserLevel>,

    /// Priority processing flag (adds a surcharge).
    #[serde(default)]
    pub is_emergency: Option<bool>,
}

impl CalculationInput {
    /// Create an input with no package, scope or flags.
    #[must_use]
    pub fn new(resource_type: ResourceType, quantity: u64, amount: f64) -> Self {
        Self {
            resource_type,
            package_id: None,
            quantity,
            amount,
            bot_id: None,
            agent_id: None,
            user_level: None,
            is_emergency: None,
        }
    }

    /// Shorthand for an energy request.
    #[must_use]
    pub fn energy(quantity: u64, amount: f64) -> Self {
        Self::new(ResourceType::Energy, quantity, amount)
    }

    /// Shorthand for a bandwidth request.
    #[must_use]
    pub fn bandwidth(quantity: u64, amount: f64) -> Self {
        Self::new(ResourceType::Bandwidth, quantity, amount)
    }

    /// Set the package.
    #[must_use]
    pub fn with_package(mut self, package_id: PackageId) -> Self {
        self.package_id = Some(package_id);
        self
    }

    /// Set the bot scope.
    #[must_use]
    pub fn with_bot(mut self, bot_id: BotId) -> Self {
        self.bot_id = Some(bot_id);
        self
    }

    /// Set the agent scope.
    #[must_use]
    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    /// Set the customer tier.
    #[must_use]
    pub fn with_user_level(mut self, level: UserLevel) -> Self {
        self.user_level = Some(level);
        self
    }

    /// Flag the request for priority processing.
    #[must_use]
    pub fn emergency(mut self) -> Self {
        self.is_emergency = Some(true);
        self
    }

    /// Whether the priority surcharge applies.
    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.is_emergency.unwrap_or(false)
    }

    /// Effective customer tier.
    #[must_use]
    pub fn level(&self) -> UserLevel {
        self.user_level.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_request() {
        let input: CalculationInput = serde_json::from_str(
            r#"{"resource_type":"bandwidth","quantity":2,"amount":2048}"#,
        )
        .unwrap();

        assert_eq!(input.resource_type, ResourceType::Bandwidth);
        assert_eq!(input.quantity, 2);
        assert!(input.package_id.is_none());
        assert!(!input.is_emergency());
        assert_eq!(input.level(), UserLevel::Regular);
    }

    #[test]
    fn unknown_resource_type_is_rejected() {
        let result: Result<CalculationInput, _> =
            serde_json::from_str(r#"{"resource_type":"storage","quantity":1,"amount":1}"#);
        assert!(result.is_err());
        assert!("storage".parse::<ResourceType>().is_err());
        assert_eq!("Energy".parse::<ResourceType>(), Ok(ResourceType::Energy));
    }
}
