use crate::config::KafkaSettings;
use crate::{Error, Result};
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, instrument};

/// Broker acknowledgment for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryMetadata {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// The broker client as seen by the startup producer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmokeSender: Send + Sync {
    /// Sends one record and waits at most `timeout` for the acknowledgment.
    async fn send_and_wait(
        &self,
        topic: &str,
        key: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<DeliveryMetadata>;

    /// Hands one record to the client without waiting for delivery. Only
    /// failures to enqueue are reported.
    fn send_no_wait(&self, topic: &str, key: &str, value: &str) -> Result<()>;

    /// Delivers anything still queued. Blocks the calling thread.
    fn flush(&self, timeout: Duration) -> Result<()>;
}

pub struct KafkaProducer {
    producer: FutureProducer,
}

impl KafkaProducer {
    pub fn new(settings: &KafkaSettings, ack_timeout: Duration) -> Result<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", settings.brokers().join(","))
            .set("client.id", &settings.client_id)
            .set("acks", &settings.acks)
            .set("compression.type", &settings.compression)
            .set("message.timeout.ms", ack_timeout.as_millis().to_string());

        if let Some(protocol) = &settings.security_protocol {
            client_config.set("security.protocol", protocol);
        }
        if let Some(mechanism) = &settings.sasl_mechanism {
            client_config.set("sasl.mechanisms", mechanism);
        }

        let producer: FutureProducer = client_config.create().map_err(Error::Kafka)?;

        debug!(brokers = ?settings.brokers(), "Kafka producer created");

        Ok(Self { producer })
    }
}

#[async_trait]
impl SmokeSender for KafkaProducer {
    #[instrument(skip_all, fields(topic = %topic))]
    async fn send_and_wait(
        &self,
        topic: &str,
        key: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<DeliveryMetadata> {
        let record = FutureRecord::to(topic).key(key).payload(value);
        let delivery = self.producer.send(record, Timeout::After(timeout));

        match tokio::time::timeout(timeout, delivery).await {
            Ok(Ok((partition, offset))) => Ok(DeliveryMetadata {
                topic: topic.to_string(),
                partition,
                offset,
            }),
            Ok(Err((e, _))) => Err(Error::Kafka(e)),
            Err(_) => Err(Error::Timeout {
                message: format!(
                    "no acknowledgment from broker for topic '{}' within {:?}",
                    topic, timeout
                ),
            }),
        }
    }

    fn send_no_wait(&self, topic: &str, key: &str, value: &str) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        // The delivery future is dropped; librdkafka still delivers the record.
        self.producer
            .send_result(record)
            .map(|_| ())
            .map_err(|(e, _)| Error::Kafka(e))
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer.flush(Timeout::After(timeout)).map_err(Error::Kafka)
    }
}
