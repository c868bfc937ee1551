use startup_smoke_producer::properties::MapSource;
use std::env;

/// Brokers used by tests that need a running Kafka.
pub fn test_brokers() -> String {
    env::var("TEST_KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string())
}

/// Per-process topic so concurrent runs do not read each other's messages.
pub fn test_topic() -> String {
    format!("startup_smoke_test_{}", std::process::id())
}

/// Properties for an enabled run against the test brokers.
pub fn enabled_properties(topic: &str, brokers: &str) -> MapSource {
    MapSource::from_pairs([
        ("app.kafka.startup.producer.enabled", "true"),
        ("app.topic", topic),
        ("app.kafka.startup.producer.wait-for-ack", "true"),
        ("app.exit-after-send", "true"),
        ("app.kafka.startup.producer.ack-timeout-ms", "10000"),
        ("spring.kafka.bootstrap-servers", brokers),
        ("spring.kafka.producer.compression-type", "none"), // No compression for tests
    ])
}
