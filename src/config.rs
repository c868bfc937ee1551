use crate::properties::PropertySource;
use crate::{Error, Result};
use std::time::Duration;

pub const ENABLED_KEY: &str = "app.kafka.startup.producer.enabled";
pub const TOPIC_KEY: &str = "app.topic";
pub const TOPIC_FALLBACK_KEY: &str = "APP_TOPIC";
pub const WAIT_FOR_ACK_KEY: &str = "app.kafka.startup.producer.wait-for-ack";
pub const FORCE_ACK_KEY: &str = "app.kafka.startup.producer.force-ack";
pub const ACK_TIMEOUT_KEY: &str = "app.kafka.startup.producer.ack-timeout-ms";
pub const EXIT_AFTER_SEND_KEY: &str = "app.exit-after-send";

pub const BOOTSTRAP_SERVERS_KEY: &str = "spring.kafka.bootstrap-servers";
pub const CLIENT_ID_KEY: &str = "spring.kafka.client-id";
pub const ACKS_KEY: &str = "spring.kafka.producer.acks";
pub const COMPRESSION_KEY: &str = "spring.kafka.producer.compression-type";
pub const SECURITY_PROTOCOL_KEY: &str = "spring.kafka.security.protocol";
pub const SASL_MECHANISM_KEY: &str = "spring.kafka.properties.sasl.mechanism";

pub const DEFAULT_TOPIC: &str = "outbox.events.test";
pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 30_000;
/// librdkafka rejects a `message.timeout.ms` above `i32::MAX`.
pub const MAX_ACK_TIMEOUT_MS: u64 = i32::MAX as u64;

/// Everything the startup producer reads, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeConfig {
    pub topic: String,
    pub wait_for_ack: bool,
    /// When set, the ack is awaited even if `wait_for_ack` is false.
    pub force_ack: bool,
    pub exit_after_send: bool,
    pub ack_timeout: Duration,
    pub kafka: KafkaSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSettings {
    pub bootstrap_servers: Option<String>,
    pub client_id: String,
    pub acks: String,
    pub compression: String,
    pub security_protocol: Option<String>,
    pub sasl_mechanism: Option<String>,
}

impl SmokeConfig {
    /// Activation guard. Only the literal `true` (any case) enables the
    /// producer; a missing key leaves it disabled.
    pub fn is_enabled(source: &dyn PropertySource) -> bool {
        source
            .get(ENABLED_KEY)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Resolves all values. The topic is not validated here; see
    /// [`SmokeConfig::validate_topic`].
    pub fn load(source: &dyn PropertySource) -> Result<Self> {
        let topic = source
            .get(TOPIC_KEY)
            .or_else(|| source.get(TOPIC_FALLBACK_KEY))
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let ack_timeout_ms = source.get_u64(ACK_TIMEOUT_KEY, DEFAULT_ACK_TIMEOUT_MS)?;
        if ack_timeout_ms == 0 || ack_timeout_ms > MAX_ACK_TIMEOUT_MS {
            return Err(Error::Config(format!(
                "{} must be between 1 and {}, got {}",
                ACK_TIMEOUT_KEY, MAX_ACK_TIMEOUT_MS, ack_timeout_ms
            )));
        }

        Ok(Self {
            topic: topic.trim().to_string(),
            wait_for_ack: source.get_bool(WAIT_FOR_ACK_KEY, true)?,
            force_ack: source.get_bool(FORCE_ACK_KEY, true)?,
            exit_after_send: source.get_bool(EXIT_AFTER_SEND_KEY, true)?,
            ack_timeout: Duration::from_millis(ack_timeout_ms),
            kafka: KafkaSettings::load(source),
        })
    }

    pub fn validate_topic(&self) -> Result<&str> {
        if self.topic.is_empty() {
            return Err(Error::Config(
                "APP_TOPIC/app.topic is required (env var or property).".to_string(),
            ));
        }
        Ok(&self.topic)
    }

    /// Whether the run blocks for the broker acknowledgment.
    pub fn awaits_ack(&self) -> bool {
        self.wait_for_ack || self.force_ack
    }
}

impl KafkaSettings {
    pub fn load(source: &dyn PropertySource) -> Self {
        Self {
            bootstrap_servers: non_blank(source.get(BOOTSTRAP_SERVERS_KEY)),
            client_id: source.get_or(CLIENT_ID_KEY, "startup-smoke-producer"),
            acks: source.get_or(ACKS_KEY, &default_acks()),
            compression: source.get_or(COMPRESSION_KEY, "none"),
            security_protocol: non_blank(source.get(SECURITY_PROTOCOL_KEY)),
            sasl_mechanism: non_blank(source.get(SASL_MECHANISM_KEY)),
        }
    }

    /// The configured bootstrap list, or `<missing>` for log output.
    pub fn bootstrap_display(&self) -> &str {
        self.bootstrap_servers.as_deref().unwrap_or("<missing>")
    }

    pub fn brokers(&self) -> Vec<String> {
        self.bootstrap_servers
            .as_deref()
            .unwrap_or(DEFAULT_BOOTSTRAP_SERVERS)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_acks() -> String {
    "all".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{EnvSource, MapSource};

    #[test]
    fn test_defaults() {
        let config = SmokeConfig::load(&MapSource::new("empty")).unwrap();
        assert_eq!(config.topic, DEFAULT_TOPIC);
        assert!(config.wait_for_ack);
        assert!(config.force_ack);
        assert!(config.exit_after_send);
        assert_eq!(config.ack_timeout, Duration::from_secs(30));
        assert_eq!(config.kafka.acks, "all");
        assert_eq!(config.kafka.compression, "none");
        assert_eq!(config.kafka.bootstrap_display(), "<missing>");
        assert_eq!(config.kafka.brokers(), vec!["localhost:9092".to_string()]);
    }

    #[test]
    fn test_guard() {
        assert!(!SmokeConfig::is_enabled(&MapSource::new("empty")));
        assert!(SmokeConfig::is_enabled(&MapSource::from_pairs([(ENABLED_KEY, "TRUE")])));
        assert!(!SmokeConfig::is_enabled(&MapSource::from_pairs([(ENABLED_KEY, "yes")])));
        assert!(!SmokeConfig::is_enabled(&MapSource::from_pairs([(ENABLED_KEY, "false")])));
        assert!(SmokeConfig::is_enabled(&EnvSource::from_vars([(
            "APP_KAFKA_STARTUP_PRODUCER_ENABLED",
            "true"
        )])));
    }

    #[test]
    fn test_topic_resolution() {
        let source = MapSource::from_pairs([("app.topic", "canonical"), ("APP_TOPIC", "fallback")]);
        assert_eq!(SmokeConfig::load(&source).unwrap().topic, "canonical");

        let source = MapSource::from_pairs([("APP_TOPIC", "fallback")]);
        assert_eq!(SmokeConfig::load(&source).unwrap().topic, "fallback");

        let source = EnvSource::from_vars([("APP_TOPIC", "from-env")]);
        assert_eq!(SmokeConfig::load(&source).unwrap().topic, "from-env");
    }

    #[test]
    fn test_blank_topic_is_kept_and_rejected() {
        let source = MapSource::from_pairs([("app.topic", "   ")]);
        let config = SmokeConfig::load(&source).unwrap();
        assert_eq!(config.topic, "");
        assert!(matches!(config.validate_topic(), Err(Error::Config(_))));
    }

    #[test]
    fn test_ack_modes() {
        let source = MapSource::from_pairs([(WAIT_FOR_ACK_KEY, "false")]);
        let config = SmokeConfig::load(&source).unwrap();
        assert!(!config.wait_for_ack);
        assert!(config.awaits_ack());

        let source = MapSource::from_pairs([(WAIT_FOR_ACK_KEY, "false"), (FORCE_ACK_KEY, "false")]);
        assert!(!SmokeConfig::load(&source).unwrap().awaits_ack());
    }

    #[test]
    fn test_invalid_values() {
        let source = MapSource::from_pairs([(EXIT_AFTER_SEND_KEY, "later")]);
        assert!(matches!(SmokeConfig::load(&source), Err(Error::Config(_))));

        let source = MapSource::from_pairs([(ACK_TIMEOUT_KEY, "0")]);
        assert!(matches!(SmokeConfig::load(&source), Err(Error::Config(_))));

        let source = MapSource::from_pairs([(ACK_TIMEOUT_KEY, "soon")]);
        assert!(SmokeConfig::load(&source).is_err());
    }

    #[test]
    fn test_ack_timeout_upper_bound() {
        let source = MapSource::from_pairs([(ACK_TIMEOUT_KEY, "99999999999")]);
        let err = SmokeConfig::load(&source).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(ACK_TIMEOUT_KEY));

        let max = MAX_ACK_TIMEOUT_MS.to_string();
        let source = MapSource::from_pairs([(ACK_TIMEOUT_KEY, max.as_str())]);
        let config = SmokeConfig::load(&source).unwrap();
        assert_eq!(config.ack_timeout, Duration::from_millis(i32::MAX as u64));

        let above = (MAX_ACK_TIMEOUT_MS + 1).to_string();
        let source = MapSource::from_pairs([(ACK_TIMEOUT_KEY, above.as_str())]);
        assert!(SmokeConfig::load(&source).is_err());
    }

    #[test]
    fn test_kafka_settings() {
        let source = MapSource::from_pairs([
            (BOOTSTRAP_SERVERS_KEY, "b-1.msk:9098, b-2.msk:9098,"),
            (SECURITY_PROTOCOL_KEY, "SASL_SSL"),
            (SASL_MECHANISM_KEY, " "),
            (ACKS_KEY, "1"),
        ]);
        let settings = KafkaSettings::load(&source);
        assert_eq!(
            settings.brokers(),
            vec!["b-1.msk:9098".to_string(), "b-2.msk:9098".to_string()]
        );
        assert_eq!(settings.bootstrap_display(), "b-1.msk:9098, b-2.msk:9098,");
        assert_eq!(settings.security_protocol.as_deref(), Some("SASL_SSL"));
        assert_eq!(settings.sasl_mechanism, None);
        assert_eq!(settings.acks, "1");
        assert_eq!(settings.client_id, "startup-smoke-producer");
    }
}
