//! Metrics module for commerce-service.
//! Provides Prometheus metrics for catalog, order and invoice operations.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "commerce_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Orders placed counter
pub static ORDERS_PLACED_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Order status transition counter
pub static ORDER_TRANSITIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Invoice status transition counter
pub static INVOICE_TRANSITIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    // Orders placed
    ORDERS_PLACED_TOTAL.get_or_init(|| {
        register_int_counter!(opts!(
            "commerce_orders_placed_total",
            "Total orders placed successfully"
        ))
        .expect("Failed to register ORDERS_PLACED_TOTAL")
    });

    // Order transitions
    ORDER_TRANSITIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "commerce_order_transitions_total",
                "Total order status transitions by target status"
            ),
            &["status"]
        )
        .expect("Failed to register ORDER_TRANSITIONS_TOTAL")
    });

    // Invoice transitions
    INVOICE_TRANSITIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "commerce_invoice_transitions_total",
                "Total invoice status transitions by target status"
            ),
            &["status"]
        )
        .expect("Failed to register INVOICE_TRANSITIONS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a placed order.
pub fn record_order_placed() {
    if let Some(counter) = ORDERS_PLACED_TOTAL.get() {
        counter.inc();
    }
}

/// Record an order status transition.
pub fn record_order_transition(status: &str) {
    if let Some(counter) = ORDER_TRANSITIONS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Record an invoice status transition.
pub fn record_invoice_transition(status: &str) {
    if let Some(counter) = INVOICE_TRANSITIONS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}
