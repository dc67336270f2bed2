//! Case registry: name-addressed lookup over the conformance content.

use crate::case::Case;
use crate::cases;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered cases, addressable by name
pub struct SuiteRegistry {
    cases: HashMap<String, Arc<dyn Case>>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self {
            cases: HashMap::new(),
        }
    }

    pub fn register(&mut self, case: Arc<dyn Case>) {
        self.cases.insert(case.name().to_string(), case);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Case>> {
        self.cases.get(name).cloned()
    }

    /// All cases, sorted by name for stable listings
    pub fn list(&self) -> Vec<Arc<dyn Case>> {
        let mut cases: Vec<_> = self.cases.values().cloned().collect();
        cases.sort_by(|a, b| a.name().cmp(b.name()));
        cases
    }

    /// Cases whose name contains `filter`, sorted by name
    pub fn matching(&self, filter: &str) -> Vec<Arc<dyn Case>> {
        self.list()
            .into_iter()
            .filter(|case| case.name().contains(filter))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl Default for SuiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The built-in conformance cases
pub fn default_registry() -> SuiteRegistry {
    let mut registry = SuiteRegistry::new();
    registry.register(Arc::new(cases::dialog::DialogCancelCase));
    registry.register(Arc::new(cases::worker::WorkerDrainCase));
    registry.register(Arc::new(cases::snapshot::SnapshotRoundTripCase));
    registry.register(Arc::new(cases::geometry::MatrixAlgebraCase));
    registry.register(Arc::new(cases::transfer::TransferQueueCase));
    registry.register(Arc::new(cases::input::KeyDispatchCase));
    registry.register(Arc::new(cases::lifecycle::LifecycleOrderCase));
    registry.register(Arc::new(cases::units::DimensionUnitsCase));
    registry.register(Arc::new(cases::state::StateRestoreCase));
    registry
}
