//! Metrics module for blog-service.
//! Provides Prometheus metrics for post, comment and like operations.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("blog_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Posts created counter
pub static POSTS_CREATED_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Comments created counter
pub static COMMENTS_CREATED_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Post like toggle counter
pub static LIKES_TOGGLED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    // Posts created
    POSTS_CREATED_TOTAL.get_or_init(|| {
        register_int_counter!(opts!(
            "blog_posts_created_total",
            "Total posts created successfully"
        ))
        .expect("Failed to register POSTS_CREATED_TOTAL")
    });

    // Comments created
    COMMENTS_CREATED_TOTAL.get_or_init(|| {
        register_int_counter!(opts!(
            "blog_comments_created_total",
            "Total comments created successfully"
        ))
        .expect("Failed to register COMMENTS_CREATED_TOTAL")
    });

    // Like toggles
    LIKES_TOGGLED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "blog_likes_toggled_total",
                "Total post like toggles by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register LIKES_TOGGLED_TOTAL")
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

/// Record a created post.
pub fn record_post_created() {
    if let Some(counter) = POSTS_CREATED_TOTAL.get() {
        counter.inc();
    }
}

/// Record a created comment.
pub fn record_comment_created() {
    if let Some(counter) = COMMENTS_CREATED_TOTAL.get() {
        counter.inc();
    }
}

/// Record a like toggle. `liked` is the state after the toggle.
pub fn record_like_toggled(liked: bool) {
    if let Some(counter) = LIKES_TOGGLED_TOTAL.get() {
        let outcome = if liked { "liked" } else { "unliked" };
        counter.with_label_values(&[outcome]).inc();
    }
}
