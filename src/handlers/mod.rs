pub mod common;
pub mod employees;
pub mod measurements;
pub mod tool_tracker;
pub mod tools;
pub mod work_centers;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        employees::EmployeeService, measurements::MeasurementService,
        tool_tracker::ToolTrackerService, tools::ToolService, work_centers::WorkCenterService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub work_centers: Arc<WorkCenterService>,
    pub employees: Arc<EmployeeService>,
    pub tools: Arc<ToolService>,
    pub tool_tracker: Arc<ToolTrackerService>,
    pub measurements: Arc<MeasurementService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            work_centers: Arc::new(WorkCenterService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            employees: Arc::new(EmployeeService::new(db_pool.clone(), event_sender.clone())),
            tools: Arc::new(ToolService::new(db_pool.clone(), event_sender.clone())),
            tool_tracker: Arc::new(ToolTrackerService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            measurements: Arc::new(MeasurementService::new(db_pool, event_sender)),
        }
    }
}
