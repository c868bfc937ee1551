pub mod message;
pub mod producer;


pub use message::SmokeMessage;
pub use producer::{DeliveryMetadata, KafkaProducer, SmokeSender};

#[cfg(test)]
pub use producer::MockSmokeSender;
