use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, register_counter, register_counter_vec, register_gauge,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("chat_gateway_requests_total", "Requests that reached the admission gate")
            .expect("chat_gateway_requests_total registers once");
    pub static ref ADMITTED_TOTAL: Counter =
        register_counter!("chat_gateway_admitted_total", "Requests admitted by every stage")
            .expect("chat_gateway_admitted_total registers once");
    pub static ref REJECTED_TOTAL: CounterVec = register_counter_vec!(
        "chat_gateway_rejected_total",
        "Requests rejected by a gate stage",
        &["kind"]
    )
    .expect("chat_gateway_rejected_total registers once");
    // never shrinks: client keys are not evicted
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("chat_gateway_tracked_clients", "Client keys held by the rate gate")
            .expect("chat_gateway_tracked_clients registers once");
}
