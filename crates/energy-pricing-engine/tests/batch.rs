//! Batch calculation tests.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{CancellingStore, Catalog, FailingBulkStore};
use energy_pricing_core::{
    approx_eq, CalculationInput, CalculationPath, PackageId, ResourceType,
};
use energy_pricing_engine::{
    degraded_count, CalculationOptions, Calculator, EngineConfig, NetworkLoad,
    StaticNetworkStatus,
};
use energy_pricing_store::MemoryStore;
use tokio_util::sync::CancellationToken;

fn mixed_inputs(catalog: &Catalog) -> Vec<CalculationInput> {
    vec![
        CalculationInput::energy(1, 1000.0).with_package(catalog.energy.id),
        CalculationInput::energy(150, 250_000.0).with_package(catalog.tiered.id),
        CalculationInput::bandwidth(3, 20.0 * 1024.0 * 1024.0).with_package(catalog.bandwidth.id),
        CalculationInput::energy(60, 1000.0)
            .with_package(catalog.tiered.id)
            .emergency(),
        CalculationInput::energy(1, 1000.0).with_package(catalog.energy.id),
    ]
}

#[tokio::test]
async fn single_item_batch_matches_single_calculation() {
    let catalog = Catalog::new();
    let calculator = catalog.calculator();

    for input in mixed_inputs(&catalog) {
        let single = calculator
            .calculate(&input, &CalculationOptions::default())
            .unwrap();
        let batch = calculator
            .batch_calculate(vec![input], CalculationOptions::batch())
            .await;

        assert_eq!(batch.len(), 1);
        assert!(approx_eq(batch[0].final_price, single.final_price));
        assert_eq!(batch[0].path, CalculationPath::Batch);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn results_follow_input_order() {
    let catalog = Catalog::new();
    let calculator = Calculator::new(
        catalog.store.clone(),
        Arc::new(StaticNetworkStatus(NetworkLoad::Medium)),
        &EngineConfig::default().with_batch_workers(4),
    )
    .unwrap();

    let inputs: Vec<CalculationInput> = (1..=200)
        .map(|quantity| CalculationInput::energy(quantity, 1000.0).with_package(catalog.energy.id))
        .collect();

    let results = calculator
        .batch_calculate(inputs, CalculationOptions::batch())
        .await;

    assert_eq!(results.len(), 200);
    for (index, breakdown) in results.iter().enumerate() {
        assert_eq!(breakdown.quantity, index as u64 + 1);
        assert!(!breakdown.is_degraded());
    }
}

#[tokio::test]
async fn bulk_failure_falls_back_to_single_path() {
    let catalog = Catalog::new();
    let inputs = mixed_inputs(&catalog);

    let expected: Vec<f64> = {
        let calculator = catalog.calculator();
        inputs
            .iter()
            .map(|i| {
                calculator
                    .calculate(i, &CalculationOptions::default())
                    .unwrap()
                    .final_price
            })
            .collect()
    };

    let seeded = MemoryStore::new();
    for package in [&catalog.energy, &catalog.tiered, &catalog.bandwidth] {
        energy_pricing_store::ConfigWriter::put_package(&seeded, package).unwrap();
    }
    let store = Arc::new(FailingBulkStore::new(seeded));
    let calculator = Calculator::new(
        store.clone(),
        Arc::new(StaticNetworkStatus(NetworkLoad::Medium)),
        &EngineConfig::default(),
    )
    .unwrap();

    let mut with_orphan = inputs.clone();
    with_orphan.push(CalculationInput::energy(1, 1000.0).with_package(PackageId::generate()));

    let results = calculator
        .batch_calculate(with_orphan, CalculationOptions::batch())
        .await;

    assert_eq!(store.bulk_calls.load(Ordering::SeqCst), 1);
    assert_eq!(results.len(), inputs.len() + 1);
    assert!(results.iter().all(|b| b.path == CalculationPath::Fallback));
    for (breakdown, price) in results.iter().zip(&expected) {
        assert!(!breakdown.is_degraded());
        assert!(approx_eq(breakdown.final_price, *price));
    }

    let orphan = results.last().unwrap();
    assert!(orphan.is_degraded());
    assert_eq!(orphan.final_price, 0.0);
    assert_eq!(degraded_count(&results), 1);
}

#[tokio::test]
async fn item_errors_degrade_only_that_item() {
    let catalog = Catalog::new();
    let calculator = catalog.calculator();

    let inputs = vec![
        CalculationInput::energy(1, 1000.0).with_package(catalog.energy.id),
        CalculationInput::bandwidth(1, 4096.0).with_package(catalog.energy.id),
        CalculationInput::energy(1, 1000.0),
    ];

    let results = calculator
        .batch_calculate(inputs, CalculationOptions::batch())
        .await;

    assert!(!results[0].is_degraded());
    assert!(results[1].error.as_deref().unwrap().contains("invalid input"));
    assert_eq!(results[1].resource_type, ResourceType::Bandwidth);
    assert!(results[2].error.as_deref().unwrap().contains("no price configured"));
    assert!(results.iter().all(|b| b.path == CalculationPath::Batch));
}

#[tokio::test]
async fn batch_input_validation_is_opt_in() {
    let catalog = Catalog::new();
    let calculator = catalog.calculator();
    let inputs = vec![CalculationInput::energy(0, 1000.0).with_package(catalog.energy.id)];

    let unchecked = calculator
        .batch_calculate(inputs.clone(), CalculationOptions::batch())
        .await;
    assert!(!unchecked[0].is_degraded());

    let checked = calculator
        .batch_calculate(inputs, CalculationOptions::batch().with_validation(true))
        .await;
    assert!(checked[0].is_degraded());
}

#[tokio::test]
async fn cancelled_batch_returns_degraded_entries() {
    let catalog = Catalog::new();
    let calculator = catalog.calculator();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let results = calculator
        .batch_calculate_with_cancel(mixed_inputs(&catalog), CalculationOptions::batch(), cancel)
        .await;

    assert_eq!(results.len(), 5);
    assert!(results
        .iter()
        .all(|b| b.error.as_deref() == Some("cancelled")));
}

#[tokio::test]
async fn cancelling_mid_batch_keeps_finished_items() {
    let catalog = Catalog::new();
    let seeded = MemoryStore::new();
    for package in [&catalog.energy, &catalog.tiered, &catalog.bandwidth] {
        energy_pricing_store::ConfigWriter::put_package(&seeded, package).unwrap();
    }
    let cancel = CancellationToken::new();
    let store = Arc::new(CancellingStore::new(seeded, cancel.clone(), 2));
    let calculator = Calculator::new(
        store.clone(),
        Arc::new(StaticNetworkStatus(NetworkLoad::Medium)),
        &EngineConfig::default().with_batch_workers(1),
    )
    .unwrap();

    let results = calculator
        .batch_calculate_with_cancel(mixed_inputs(&catalog), CalculationOptions::batch(), cancel)
        .await;

    // The second item is in flight when the token fires and still completes.
    assert_eq!(results.len(), 5);
    assert_eq!(store.package_reads.load(Ordering::SeqCst), 2);
    for finished in &results[..2] {
        assert!(!finished.is_degraded());
        assert_eq!(finished.path, CalculationPath::Fallback);
    }
    assert!(approx_eq(results[0].final_price, 1.5));
    for unfinished in &results[2..] {
        assert_eq!(unfinished.error.as_deref(), Some("cancelled"));
        assert_eq!(unfinished.final_price, 0.0);
    }
}

#[tokio::test]
async fn deadline_mid_batch_keeps_finished_items() {
    let catalog = Catalog::new();
    let seeded = MemoryStore::new();
    for package in [&catalog.energy, &catalog.tiered, &catalog.bandwidth] {
        energy_pricing_store::ConfigWriter::put_package(&seeded, package).unwrap();
    }
    // The token never fires; the deadline does the cancelling.
    let store = Arc::new(
        CancellingStore::new(seeded, CancellationToken::new(), 0)
            .with_read_delay(Duration::from_millis(20)),
    );
    let calculator = Calculator::new(
        store,
        Arc::new(StaticNetworkStatus(NetworkLoad::Medium)),
        &EngineConfig::default().with_batch_workers(1),
    )
    .unwrap();

    let inputs: Vec<_> = (0..20)
        .map(|_| CalculationInput::energy(1, 1000.0).with_package(catalog.energy.id))
        .collect();
    let options = CalculationOptions::batch().with_timeout(Duration::from_millis(100));

    let results = calculator.batch_calculate(inputs, options).await;

    assert_eq!(results.len(), 20);
    let finished = results.iter().take_while(|b| !b.is_degraded()).count();
    assert!((1..20).contains(&finished), "finished {finished} of 20");
    assert!(results[..finished]
        .iter()
        .all(|b| approx_eq(b.final_price, 1.5)));
    assert!(results[finished..]
        .iter()
        .all(|b| b.error.as_deref() == Some("cancelled")));
}

#[tokio::test]
async fn expired_deadline_cancels_the_batch() {
    let catalog = Catalog::new();
    let calculator = catalog.calculator();
    let options = CalculationOptions::batch().with_timeout(Duration::ZERO);

    let results = calculator
        .batch_calculate(mixed_inputs(&catalog), options)
        .await;

    assert_eq!(degraded_count(&results), results.len());
}

#[tokio::test]
async fn empty_batch_is_empty() {
    let catalog = Catalog::new();
    let results = catalog
        .calculator()
        .batch_calculate(Vec::new(), CalculationOptions::batch())
        .await;
    assert!(results.is_empty());
}
