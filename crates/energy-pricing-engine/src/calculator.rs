//! Price calculation orchestration.
//!
//! A single calculation runs:
//!
//! 1. input validation (optional)
//! 2. price resolution through the override hierarchy
//! 3. scope quantity bounds
//! 4. discounts and price clamping on the resolved unit price
//! 5. resource adjustments (bulk, time of day, priority) on the discounted price
//! 6. fee and tax
//! 7. order value and spend limit check, then result validation (always)
//! 8. history observation (optional, never awaited)
//!
//! Adjustments are multiplicative, so the breakdown reports `base_amount` as
//! the adjusted undiscounted unit price and `discount_amount` as the gap
//! between that subtotal and the adjusted discounted one.
//!
//! Batches resolve every distinct configuration once and price items on a
//! worker pool. If the bulk resolution fails, every item is recomputed on
//! its own; items that still fail come back as degraded entries. Store reads
//! made for a batch run on the blocking pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use energy_pricing_core::{
    round_price, CalculationInput, CalculationPath, PriceBreakdown, PricingError, Result,
    SystemLimits, ValidationIssue, PRICE_CURRENCY,
};
use energy_pricing_store::ConfigStore;

use crate::adjuster::{adjuster_for, current_load, NetworkLoad, NetworkStatusProvider};
use crate::config::EngineConfig;
use crate::discount::DiscountEngine;
use crate::history::{HistoryRecorder, Observation, ENGINE_ACTOR};
use crate::resolver::{BulkResolution, PriceResolver, ResolutionKey, ResolvedPrice};
use crate::validator::Validator;

/// Error recorded on batch entries that were not computed before cancellation.
pub const CANCELLED: &str = "cancelled";

/// Per-call options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculationOptions {
    /// Run input validation before pricing.
    pub validate_input: bool,
    /// Record the resolved price in the history.
    pub include_history: bool,
    /// Give up on unfinished batch items at this instant.
    pub deadline: Option<Instant>,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            validate_input: true,
            include_history: true,
            deadline: None,
        }
    }
}

impl CalculationOptions {
    /// Batch defaults: no input validation, no history.
    #[must_use]
    pub fn batch() -> Self {
        Self {
            validate_input: false,
            include_history: false,
            deadline: None,
        }
    }

    /// Set the input validation flag.
    #[must_use]
    pub fn with_validation(mut self, validate_input: bool) -> Self {
        self.validate_input = validate_input;
        self
    }

    /// Set the history flag.
    #[must_use]
    pub fn with_history(mut self, include_history: bool) -> Self {
        self.include_history = include_history;
        self
    }

    /// Set a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }
}

/// Values shared by every item of a calculation.
struct PricingContext {
    limits: SystemLimits,
    load: NetworkLoad,
}

/// The pricing engine.
///
/// Stateless between calls and cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct Calculator {
    store: Arc<dyn ConfigStore>,
    network: Arc<dyn NetworkStatusProvider>,
    resolver: PriceResolver,
    validator: Validator,
    discounts: DiscountEngine,
    recorder: Option<HistoryRecorder>,
    workers: usize,
}

impl Calculator {
    /// Create a calculator.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::Configuration` if the configuration is invalid.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        network: Arc<dyn NetworkStatusProvider>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver: PriceResolver::new(Arc::clone(&store), config),
            store,
            network,
            validator: Validator::new(config),
            discounts: DiscountEngine,
            recorder: None,
            workers: config.worker_count(),
        })
    }

    /// Attach a history recorder.
    #[must_use]
    pub fn with_history(mut self, recorder: HistoryRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// The validator this calculator uses.
    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The resolver this calculator uses.
    #[must_use]
    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// Price one request.
    ///
    /// # Errors
    ///
    /// - `PricingError::InputValidation` if the request is invalid
    /// - `PricingError::ConfigNotFound` if nothing prices the request
    /// - `PricingError::SpendLimitExceeded` if the total is over the tier limit
    /// - `PricingError::ResultInconsistency` if the breakdown fails validation
    /// - `PricingError::Store` if the store fails
    #[instrument(
        skip(self, input, options),
        fields(resource_type = %input.resource_type, quantity = input.quantity)
    )]
    pub fn calculate(
        &self,
        input: &CalculationInput,
        options: &CalculationOptions,
    ) -> Result<PriceBreakdown> {
        self.calculate_on_path(input, options, CalculationPath::Single)
    }

    /// Price a batch with batch defaults and no cancellation.
    pub async fn batch_calculate(
        &self,
        inputs: Vec<CalculationInput>,
        options: CalculationOptions,
    ) -> Vec<PriceBreakdown> {
        self.batch_calculate_with_cancel(inputs, options, CancellationToken::new())
            .await
    }

    /// Price a batch.
    ///
    /// Always returns one breakdown per input, in input order. Items that
    /// could not be priced, or were not reached before `cancel` fired or the
    /// deadline passed, are degraded entries with `error` set.
    #[instrument(skip(self, inputs, options, cancel), fields(items = inputs.len()))]
    pub async fn batch_calculate_with_cancel(
        &self,
        inputs: Vec<CalculationInput>,
        options: CalculationOptions,
        cancel: CancellationToken,
    ) -> Vec<PriceBreakdown> {
        if inputs.is_empty() {
            return Vec::new();
        }

        let token = cancel.child_token();
        if options.deadline.is_some_and(|d| d <= Instant::now()) {
            token.cancel();
        }

        let inputs = Arc::new(inputs);
        let (bulk, context) = self.prepare_batch(Arc::clone(&inputs)).await;
        let next = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut workers = JoinSet::new();
        for _ in 0..self.workers.min(inputs.len()) {
            let calculator = self.clone();
            let inputs = Arc::clone(&inputs);
            let bulk = bulk.clone();
            let context = Arc::clone(&context);
            let next = Arc::clone(&next);
            let token = token.clone();
            let tx = tx.clone();

            workers.spawn(async move {
                loop {
                    if token.is_cancelled() {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(input) = inputs.get(index) else {
                        break;
                    };

                    let breakdown = match bulk.as_deref() {
                        Some(bulk) => calculator.price_batch_item(input, &options, bulk, &context),
                        None => calculator.price_individually(input.clone(), options).await,
                    };
                    if tx.send((index, breakdown)).is_err() {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
            });
        }
        drop(tx);

        let mut results: Vec<Option<PriceBreakdown>> = vec![None; inputs.len()];
        let expiry = expire_at(options.deadline);
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some((index, breakdown)) => results[index] = Some(breakdown),
                    None => break,
                },
                () = &mut expiry, if !token.is_cancelled() => {
                    tracing::warn!("Batch deadline passed, cancelling remaining items");
                    token.cancel();
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Batch worker failed");
            }
        }

        let reason = if token.is_cancelled() {
            CANCELLED
        } else {
            "item was not priced"
        };
        let path = if bulk.is_some() {
            CalculationPath::Batch
        } else {
            CalculationPath::Fallback
        };

        let breakdowns: Vec<PriceBreakdown> = results
            .into_iter()
            .zip(inputs.iter())
            .map(|(result, input)| {
                result.unwrap_or_else(|| {
                    PriceBreakdown::degraded(input.resource_type, input.quantity, path, reason)
                })
            })
            .collect();

        let degraded = degraded_count(&breakdowns);
        tracing::info!(
            items = breakdowns.len(),
            degraded,
            path = ?path,
            "Batch priced"
        );

        breakdowns
    }

    fn calculate_on_path(
        &self,
        input: &CalculationInput,
        options: &CalculationOptions,
        path: CalculationPath,
    ) -> Result<PriceBreakdown> {
        let warnings = self.check_input(input, options)?;
        let resolved = self.resolver.resolve(input)?;
        let breakdown = self.assemble(input, &resolved, &self.context(), path, warnings)?;

        if options.include_history {
            self.observe(&resolved);
        }

        Ok(breakdown)
    }

    /// Bulk resolution and the shared context read the store, so they run on
    /// the blocking pool.
    async fn prepare_batch(
        &self,
        inputs: Arc<Vec<CalculationInput>>,
    ) -> (Option<Arc<BulkResolution>>, Arc<PricingContext>) {
        let calculator = self.clone();
        let prepared = tokio::task::spawn_blocking(move || {
            let bulk = match calculator.resolver.resolve_bulk(&inputs) {
                Ok(resolved) => Some(Arc::new(resolved)),
                Err(e) => {
                    tracing::warn!(error = %e, "Bulk resolution failed, pricing items individually");
                    None
                }
            };
            (bulk, Arc::new(calculator.context()))
        })
        .await;

        prepared.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Batch preparation failed, pricing items individually");
            (
                None,
                Arc::new(PricingContext {
                    limits: SystemLimits::default(),
                    load: NetworkLoad::Medium,
                }),
            )
        })
    }

    /// Price one batch item through the single path on the blocking pool.
    async fn price_individually(
        &self,
        input: CalculationInput,
        options: CalculationOptions,
    ) -> PriceBreakdown {
        let calculator = self.clone();
        let (resource_type, quantity) = (input.resource_type, input.quantity);
        let priced = tokio::task::spawn_blocking(move || {
            calculator.calculate_on_path(&input, &options, CalculationPath::Fallback)
        })
        .await;

        let error = match priced {
            Ok(Ok(breakdown)) => return breakdown,
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("pricing task failed: {e}"),
        };
        PriceBreakdown::degraded(resource_type, quantity, CalculationPath::Fallback, error)
    }

    fn price_batch_item(
        &self,
        input: &CalculationInput,
        options: &CalculationOptions,
        bulk: &BulkResolution,
        context: &PricingContext,
    ) -> PriceBreakdown {
        let priced = self.check_input(input, options).and_then(|warnings| {
            let resolved = match bulk.get(&ResolutionKey::of(input)) {
                Some(Ok(resolved)) => resolved,
                Some(Err(e)) => return Err(clone_error(e)),
                None => {
                    return Err(PricingError::ConfigNotFound {
                        resource_type: input.resource_type,
                        package_id: input.package_id,
                    })
                }
            };
            let breakdown =
                self.assemble(input, resolved, context, CalculationPath::Batch, warnings)?;
            if options.include_history {
                self.observe(resolved);
            }
            Ok(breakdown)
        });

        priced.unwrap_or_else(|e| {
            PriceBreakdown::degraded(
                input.resource_type,
                input.quantity,
                CalculationPath::Batch,
                e.to_string(),
            )
        })
    }

    fn check_input(
        &self,
        input: &CalculationInput,
        options: &CalculationOptions,
    ) -> Result<Vec<ValidationIssue>> {
        if !options.validate_input {
            return Ok(Vec::new());
        }

        let result = self.validator.validate_input(input);
        if result.is_valid {
            Ok(result.warnings)
        } else {
            Err(PricingError::InputValidation {
                issues: result.errors,
            })
        }
    }

    fn context(&self) -> PricingContext {
        let limits = self.store.get_system_limits().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "System limits unavailable, using defaults");
            SystemLimits::default()
        });

        PricingContext {
            limits,
            load: current_load(self.network.as_ref()),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn assemble(
        &self,
        input: &CalculationInput,
        resolved: &ResolvedPrice,
        context: &PricingContext,
        path: CalculationPath,
        mut warnings: Vec<ValidationIssue>,
    ) -> Result<PriceBreakdown> {
        check_scope_quantity(input, resolved)?;

        let scope = &resolved.scope;
        let discount = self
            .discounts
            .apply_discounts(resolved.unit_price, input, scope);

        let adjuster = adjuster_for(input.resource_type);
        let adjustment = adjuster.adjust(discount.unit_price, input, context.load);
        let base_amount = adjuster
            .adjust(resolved.unit_price, input, context.load)
            .price;

        let subtotal = round_price(base_amount * input.quantity as f64);
        let discounted = round_price(adjustment.price * input.quantity as f64);
        let discount_amount = round_price(subtotal - discounted).max(0.0);
        let fee_amount = round_price(scope.fee_amount.max(0.0));
        let taxable = subtotal - discount_amount + fee_amount;
        let tax_amount = round_price(taxable * scope.tax_percent.max(0.0) / 100.0);
        let total = round_price(taxable + tax_amount);

        let mut breakdown = PriceBreakdown {
            resource_type: input.resource_type,
            unit_price: resolved.unit_price,
            base_amount,
            quantity: input.quantity,
            subtotal,
            discount_amount,
            fee_amount,
            tax_amount,
            total,
            final_price: total,
            currency: PRICE_CURRENCY.to_string(),
            override_level: resolved.level,
            applied_rules: discount.applied_rules,
            adjustments: adjustment.applied,
            warnings: Vec::new(),
            path,
            error: None,
        };

        self.validator
            .check_spend_limit(&breakdown, input, &context.limits)?;

        let checked = self
            .validator
            .validate_result(&breakdown, input, &context.limits);
        if !checked.is_valid {
            tracing::error!(
                issues = ?checked.errors,
                resource_type = %input.resource_type,
                package_id = ?input.package_id,
                "Inconsistent price breakdown"
            );
            return Err(PricingError::ResultInconsistency {
                issues: checked.errors,
            });
        }

        warnings.extend(checked.warnings);
        breakdown.warnings = warnings;

        tracing::debug!(
            level = resolved.level.as_str(),
            unit_price = resolved.unit_price,
            final_price = breakdown.final_price,
            "Price calculated"
        );

        Ok(breakdown)
    }

    fn observe(&self, resolved: &ResolvedPrice) {
        let (Some(recorder), Some((entity_type, entity_id))) = (&self.recorder, &resolved.entity)
        else {
            return;
        };

        recorder.observe(Observation {
            entity_type: *entity_type,
            entity_id: entity_id.clone(),
            price: resolved.unit_price,
            reason: "price_calculation".into(),
            actor: ENGINE_ACTOR.into(),
            metadata: serde_json::json!({ "override_level": resolved.level.as_str() }),
        });
    }
}

fn check_scope_quantity(input: &CalculationInput, resolved: &ResolvedPrice) -> Result<()> {
    let scope = &resolved.scope;
    let mut issues = Vec::new();

    if let Some(min) = scope.min_quantity {
        if input.quantity < min {
            issues.push(ValidationIssue::new(
                "quantity",
                "below_min_quantity",
                format!("quantity {} is below the minimum of {min}", input.quantity),
            ));
        }
    }
    if let Some(max) = scope.max_quantity {
        if input.quantity > max {
            issues.push(ValidationIssue::new(
                "quantity",
                "above_max_quantity",
                format!("quantity {} is above the maximum of {max}", input.quantity),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(PricingError::InputValidation { issues })
    }
}

/// Per-key resolution errors are shared between items, so each item gets
/// its own copy.
fn clone_error(error: &PricingError) -> PricingError {
    match error {
        PricingError::InputValidation { issues } => PricingError::InputValidation {
            issues: issues.clone(),
        },
        PricingError::ConfigNotFound {
            resource_type,
            package_id,
        } => PricingError::ConfigNotFound {
            resource_type: *resource_type,
            package_id: *package_id,
        },
        other => PricingError::Store(other.to_string()),
    }
}

async fn expire_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Number of degraded entries in a batch result.
#[must_use]
pub fn degraded_count(breakdowns: &[PriceBreakdown]) -> usize {
    breakdowns.iter().filter(|b| b.is_degraded()).count()
}
