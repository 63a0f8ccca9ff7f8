//! Audit events for account lifecycle operations
//!
//! Audit emission is fire-and-forget: sinks must not block or fail the
//! operation that produced the event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Account lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    Register,
    RegisterFailed,
    Login,
    LoginFailed,
    Logout,
    LogoutFailed,
    LogoutAll,
    Refresh,
    RefreshFailed,
}

impl AuditEventType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::RegisterFailed => "register_failed",
            Self::Login => "login",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::LogoutFailed => "logout_failed",
            Self::LogoutAll => "logout_all",
            Self::Refresh => "refresh",
            Self::RefreshFailed => "refresh_failed",
        }
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
}

/// A single audit record
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub service: String,
    pub event_type: AuditEventType,
    pub subject_id: String,
    pub description: String,
    pub severity: Severity,
    pub metadata: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        event_type: AuditEventType,
        subject_id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            service: service.into(),
            event_type,
            subject_id: subject_id.into(),
            description: description.into(),
            severity,
            metadata: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp, stamped with the wall clock by default
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add metadata
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Writes audit events as structured tracing events under the `audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        match event.severity {
            Severity::Info => info!(
                target: "audit",
                service = %event.service,
                event_type = event.event_type.as_str(),
                subject_id = %event.subject_id,
                metadata = %metadata,
                "{}",
                event.description
            ),
            Severity::Warn => warn!(
                target: "audit",
                service = %event.service,
                event_type = event.event_type.as_str(),
                subject_id = %event.subject_id,
                metadata = %metadata,
                "{}",
                event.description
            ),
        }
    }
}

/// Keeps every event in memory; handy for assertions
#[derive(Debug, Clone, Default)]
pub struct RecordingAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events emitted so far
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::new(
            "auth-service",
            AuditEventType::LoginFailed,
            "alice@example.com",
            "Login failed: invalid password",
            Severity::Warn,
        )
        .with_metadata("email", "alice@example.com")
        .with_metadata("reason", "invalid_password");

        assert_eq!(event.event_type.as_str(), "login_failed");
        assert_eq!(event.metadata.get("reason").map(String::as_str), Some("invalid_password"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "login_failed");
        assert_eq!(json["severity"], "WARN");
    }

    #[test]
    fn test_recording_sink_collects() {
        let sink = RecordingAuditSink::new();
        sink.emit(AuditEvent::new(
            "svc",
            AuditEventType::Logout,
            "u1",
            "bye",
            Severity::Info,
        ));
        assert_eq!(sink.events().len(), 1);
    }
}
