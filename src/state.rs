use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use crate::clock::Clock;
use crate::config::GateConfig;
use crate::gate::AdmissionGate;
use crate::models::ChatMessage;
use crate::permissions::RoleGate;
use crate::rate_limit::RateGate;
use crate::time_window::TimeWindowGate;

// app's shared state

pub struct AppState {
    pub clock: Arc<dyn Clock>,
    pub gate: AdmissionGate,           // time window -> rate -> role
    pub rate_gate: Arc<RateGate>,      // also inside `gate`, kept for the gauge
    pub messages: DashMap<u64, ChatMessage>, // id -> message
    pub next_message_id: AtomicU64,
}

impl AppState {
    pub fn new(config: &GateConfig, clock: Arc<dyn Clock>) -> Self {
        let rate_gate = Arc::new(RateGate::new(
            config.max_requests,
            config.window_seconds,
            config.rate_methods.clone(),
        ));
        let gate = AdmissionGate::new()
            .then(Arc::new(TimeWindowGate::new(config.allowed_start, config.allowed_end)))
            .then(rate_gate.clone())
            .then(Arc::new(RoleGate::new(config.protected_paths.clone())));

        Self {
            clock,
            gate,
            rate_gate,
            messages: DashMap::new(),
            next_message_id: AtomicU64::new(1),
        }
    }
}
