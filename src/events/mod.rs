use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Sending half of the in-process domain event channel
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event after a committed write. The write already happened, so
    /// a closed channel is logged rather than surfaced to the caller.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "Dropping domain event");
        }
    }
}

/// Domain events emitted after a write commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    WorkCenterCreated(Uuid),
    WorkCenterUpdated(Uuid),
    WorkCenterDeleted(Uuid),

    EmployeeCreated(Uuid),
    EmployeeUpdated(Uuid),
    EmployeeDeleted(Uuid),

    ToolCreated(Uuid),
    ToolUpdated(Uuid),
    ToolDeleted(Uuid),

    ToolCheckedOut {
        tool_id: Uuid,
        transaction_id: Uuid,
        employee_id: Uuid,
        to_location_id: Option<Uuid>,
        checked_out_at: DateTime<Utc>,
    },
    ToolReturned {
        tool_id: Uuid,
        transaction_id: Uuid,
        returned_by: Option<Uuid>,
        returned_to_location_id: Option<Uuid>,
        returned_at: DateTime<Utc>,
    },

    MeasurementRecorded {
        measure_id: Uuid,
        tool_id: Uuid,
        within_tolerance: Option<bool>,
    },
    MeasurementDeleted(Uuid),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::WorkCenterCreated(_) => "work_center_created",
            Event::WorkCenterUpdated(_) => "work_center_updated",
            Event::WorkCenterDeleted(_) => "work_center_deleted",
            Event::EmployeeCreated(_) => "employee_created",
            Event::EmployeeUpdated(_) => "employee_updated",
            Event::EmployeeDeleted(_) => "employee_deleted",
            Event::ToolCreated(_) => "tool_created",
            Event::ToolUpdated(_) => "tool_updated",
            Event::ToolDeleted(_) => "tool_deleted",
            Event::ToolCheckedOut { .. } => "tool_checked_out",
            Event::ToolReturned { .. } => "tool_returned",
            Event::MeasurementRecorded { .. } => "measurement_recorded",
            Event::MeasurementDeleted(_) => "measurement_deleted",
        }
    }
}

// Handlers implementing this trait process events off the request path.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: &Event) -> Result<(), String>;
}

/// Writes every event to the application log
#[derive(Debug, Default, Clone)]
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn handle_event(&self, event: &Event) -> Result<(), String> {
        match event {
            Event::ToolCheckedOut {
                tool_id,
                transaction_id,
                employee_id,
                to_location_id,
                checked_out_at,
            } => info!(
                %tool_id,
                %transaction_id,
                %employee_id,
                to_location_id = ?to_location_id,
                %checked_out_at,
                "Tool checked out"
            ),
            Event::ToolReturned {
                tool_id,
                transaction_id,
                returned_by,
                returned_to_location_id,
                returned_at,
            } => info!(
                %tool_id,
                %transaction_id,
                returned_by = ?returned_by,
                returned_to_location_id = ?returned_to_location_id,
                %returned_at,
                "Tool returned"
            ),
            Event::MeasurementRecorded {
                measure_id,
                tool_id,
                within_tolerance: Some(false),
            } => warn!(%measure_id, %tool_id, "Measurement outside tolerance"),
            other => info!(event = other.name(), "Domain event: {:?}", other),
        }
        Ok(())
    }
}

/// Drains the event channel until every sender is dropped
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    let handlers: Vec<Box<dyn EventHandler>> = vec![Box::new(LoggingEventHandler)];
    process_events_with(&mut rx, &handlers).await
}

pub async fn process_events_with(
    rx: &mut mpsc::Receiver<Event>,
    handlers: &[Box<dyn EventHandler>],
) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        for handler in handlers {
            if let Err(e) = handler.handle_event(&event).await {
                warn!(event = event.name(), error = %e, "Event handler failed");
            }
        }
    }

    info!("Event channel closed; event processing loop stopped");
}
