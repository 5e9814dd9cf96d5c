use std::sync::Arc;

use configs::AppConfig;
use service::{
    bulk::BulkService,
    compliance::ComplianceService,
    merch::MerchService,
    mockups::MockupService,
    printify::PrintifyApi,
    storage::Stores,
    tracking::TrackingService,
};

/// Shared handler state; every service is constructed once per process.
#[derive(Clone)]
pub struct AppState {
    pub merch: Arc<MerchService>,
    pub compliance: Arc<ComplianceService>,
    pub mockups: Arc<MockupService>,
    pub tracking: Arc<TrackingService>,
    pub bulk: Arc<BulkService>,
}

impl AppState {
    pub fn new(stores: Stores, api: Arc<dyn PrintifyApi>, cfg: &AppConfig) -> Self {
        Self {
            merch: Arc::new(MerchService::new(Arc::clone(&api))),
            compliance: Arc::new(ComplianceService::new(stores.compliance)),
            mockups: Arc::new(MockupService::new(stores.mockups, Arc::clone(&api), cfg.mockups.ttl_hours)),
            tracking: Arc::new(TrackingService::new(stores.tracking)),
            bulk: Arc::new(BulkService::new(stores.bulk_operations, api)),
        }
    }
}
