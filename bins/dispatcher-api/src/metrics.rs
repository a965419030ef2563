// Prometheus metrics for the dispatcher

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder};

lazy_static! {
    pub static ref ENQUEUE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "dispatcher_enqueue_total",
        "Test list submissions by outcome",
        &["outcome"]
    )
    .expect("dispatcher_enqueue_total registers once");
    pub static ref DEQUEUE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "dispatcher_dequeue_total",
        "Next-test requests by outcome",
        &["outcome"]
    )
    .expect("dispatcher_dequeue_total registers once");
    pub static ref ACTIVE_QUEUES: IntGauge = register_int_gauge!(
        "dispatcher_active_queues",
        "Queues currently holding undispatched tests"
    )
    .expect("dispatcher_active_queues registers once");
}

pub fn record_enqueue(outcome: &str) {
    ENQUEUE_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_dequeue(outcome: &str) {
    DEQUEUE_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn set_active_queues(count: usize) {
    ACTIVE_QUEUES.set(count as i64);
}

/// Render the default registry in the text exposition format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
