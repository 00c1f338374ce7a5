//! Unit price resolution through the override hierarchy.
//!
//! The most specific active record wins: agent override, then bot override,
//! then the package default, then the system fallback for the resource type.
//! Overrides only exist on packages, so an absent or inactive package skips
//! straight to the system fallback.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::instrument;

use energy_pricing_core::{
    AgentId, BotId, CalculationInput, EntityType, OverrideLevel, OverrideScope, OverrideTarget,
    PackageId, PackageInfo, PricingError, ResourceType, Result, ValidationIssue,
};
use energy_pricing_store::ConfigStore;

use crate::config::EngineConfig;

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrice {
    /// Resolved unit price (before adjustments).
    pub unit_price: f64,
    /// Effective configuration.
    pub scope: OverrideScope,
    /// Hierarchy level that supplied the price.
    pub level: OverrideLevel,
    /// The record that supplied the price (`None` for the system fallback).
    pub entity: Option<(EntityType, String)>,
}

/// Everything resolution depends on. Requests with equal keys resolve alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    /// Resource type.
    pub resource_type: ResourceType,
    /// Package.
    pub package_id: Option<PackageId>,
    /// Bot scope.
    pub bot_id: Option<BotId>,
    /// Agent scope.
    pub agent_id: Option<AgentId>,
}

impl ResolutionKey {
    /// The key of a request.
    #[must_use]
    pub fn of(input: &CalculationInput) -> Self {
        Self {
            resource_type: input.resource_type,
            package_id: input.package_id,
            bot_id: input.bot_id,
            agent_id: input.agent_id,
        }
    }
}

/// Per-key results of a bulk resolution.
pub type BulkResolution = HashMap<ResolutionKey, Result<ResolvedPrice>>;

/// Resolves unit prices through a [`ConfigStore`].
#[derive(Clone)]
pub struct PriceResolver {
    store: Arc<dyn ConfigStore>,
    fallback_energy: Option<f64>,
    fallback_bandwidth: Option<f64>,
}

impl PriceResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            fallback_energy: config.fallback_price(ResourceType::Energy),
            fallback_bandwidth: config.fallback_price(ResourceType::Bandwidth),
        }
    }

    /// Resolve the price for one request.
    ///
    /// # Errors
    ///
    /// - `PricingError::ConfigNotFound` if no level yields a price
    /// - `PricingError::InputValidation` if the package sells another resource
    /// - `PricingError::Store` if the store fails
    #[instrument(skip(self, input), fields(resource_type = %input.resource_type, package_id = ?input.package_id))]
    pub fn resolve(&self, input: &CalculationInput) -> Result<ResolvedPrice> {
        let package = match input.package_id {
            Some(id) => self.store.get_package(&id)?,
            None => None,
        };
        self.resolve_with(&ResolutionKey::of(input), package.as_ref())
    }

    /// Resolve every distinct key among `inputs` once, reading all packages
    /// in a single bulk lookup.
    ///
    /// Per-key configuration errors are kept in the map; any store failure
    /// fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Store` if any store read fails.
    #[instrument(skip(self, inputs), fields(items = inputs.len()))]
    pub fn resolve_bulk(&self, inputs: &[CalculationInput]) -> Result<BulkResolution> {
        let keys: HashSet<ResolutionKey> = inputs.iter().map(ResolutionKey::of).collect();
        let package_ids: Vec<PackageId> = keys
            .iter()
            .filter_map(|k| k.package_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let packages = if package_ids.is_empty() {
            HashMap::new()
        } else {
            self.store.get_packages(&package_ids)?
        };

        let mut resolved = HashMap::with_capacity(keys.len());
        for key in keys {
            let package = key.package_id.and_then(|id| packages.get(&id));
            match self.resolve_with(&key, package) {
                Err(PricingError::Store(message)) => return Err(PricingError::Store(message)),
                result => {
                    resolved.insert(key, result);
                }
            }
        }

        tracing::debug!(
            keys = resolved.len(),
            packages = packages.len(),
            "Bulk resolution complete"
        );
        Ok(resolved)
    }

    fn resolve_with(
        &self,
        key: &ResolutionKey,
        package: Option<&PackageInfo>,
    ) -> Result<ResolvedPrice> {
        let Some(package) = package.filter(|p| p.status.is_active()) else {
            return self.system_fallback(key);
        };

        if package.resource_type != key.resource_type {
            return Err(PricingError::InputValidation {
                issues: vec![ValidationIssue::new(
                    "resource_type",
                    "resource_type_mismatch",
                    format!(
                        "package {} sells {}, not {}",
                        package.id, package.resource_type, key.resource_type
                    ),
                )],
            });
        }

        let base = package.default_scope();

        let targets = [
            key.agent_id.map(|id| (OverrideTarget::Agent(id), OverrideLevel::Agent)),
            key.bot_id.map(|id| (OverrideTarget::Bot(id), OverrideLevel::Bot)),
        ];
        for (target, level) in targets.into_iter().flatten() {
            let Some(over) = self.store.get_override(&target, &package.id)? else {
                continue;
            };
            if !over.status.is_active() {
                tracing::debug!(?target, package_id = %package.id, "Skipping inactive override");
                continue;
            }

            let scope = over.apply_to(&base);
            let entity = target.history_entity(&package.id);
            return Ok(ResolvedPrice {
                unit_price: scope.unit_price,
                scope,
                level,
                entity: Some(entity),
            });
        }

        Ok(ResolvedPrice {
            unit_price: base.unit_price,
            scope: base,
            level: OverrideLevel::Package,
            entity: Some((EntityType::Package, package.id.to_string())),
        })
    }

    fn system_fallback(&self, key: &ResolutionKey) -> Result<ResolvedPrice> {
        let price = match key.resource_type {
            ResourceType::Energy => self.fallback_energy,
            ResourceType::Bandwidth => self.fallback_bandwidth,
        };

        match price {
            Some(unit_price) => Ok(ResolvedPrice {
                unit_price,
                scope: OverrideScope::flat(unit_price),
                level: OverrideLevel::System,
                entity: None,
            }),
            None => Err(PricingError::ConfigNotFound {
                resource_type: key.resource_type,
                package_id: key.package_id,
            }),
        }
    }
}
