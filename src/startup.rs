//! The run-once startup producer.
//!
//! [`run_from`] applies the activation guard, resolves the configuration,
//! creates the client and sends exactly one record through
//! [`StartupSmokeProducer::run`]. It never terminates the process itself; the
//! entry point decides whether to keep running and then calls
//! [`StartupRun::shutdown`] to flush the client and obtain the exit code.
//!
//! # Example
//!
//! ```rust,no_run
//! use startup_smoke_producer::kafka::KafkaProducer;
//! use startup_smoke_producer::properties::EnvSource;
//! use startup_smoke_producer::startup::run_from;
//!
//! #[tokio::main]
//! async fn main() {
//!     let env = EnvSource::from_process();
//!     let run = run_from(&env, |config| {
//!         KafkaProducer::new(&config.kafka, config.ack_timeout)
//!     })
//!     .await;
//!
//!     let code = run.outcome.exit_code().unwrap_or(0);
//!     std::process::exit(run.shutdown(code));
//! }
//! ```

use crate::config::{SmokeConfig, DEFAULT_ACK_TIMEOUT_MS, ENABLED_KEY};
use crate::kafka::{DeliveryMetadata, SmokeMessage, SmokeSender};
use crate::properties::PropertySource;
use crate::{Error, Result};
use std::time::Duration;
use tracing::{error, info, warn};

/// Result of one startup run.
#[derive(Debug)]
pub enum ExitOutcome {
    /// The activation guard was not met; nothing was sent.
    Skipped,
    /// The record was handed to the broker. `delivery` is `None` when the
    /// acknowledgment was not awaited.
    Succeeded {
        message: SmokeMessage,
        delivery: Option<DeliveryMetadata>,
        exit: bool,
    },
    /// Configuration or send failure. Always terminates with code 1.
    Failed { error: Error },
}

impl ExitOutcome {
    /// Logs the terminal failure line and wraps the error.
    pub fn failed(error: Error) -> Self {
        error!(error = %error, "DONE produced=0 exitCode=1");
        ExitOutcome::Failed { error }
    }

    /// The code to terminate with, or `None` when the process keeps running.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExitOutcome::Skipped => None,
            ExitOutcome::Succeeded { exit: true, .. } => Some(0),
            ExitOutcome::Succeeded { exit: false, .. } => None,
            ExitOutcome::Failed { .. } => Some(1),
        }
    }

    pub fn produced(&self) -> u32 {
        match self {
            ExitOutcome::Succeeded { .. } => 1,
            _ => 0,
        }
    }
}

pub struct StartupSmokeProducer<'a, S: SmokeSender + ?Sized> {
    sender: &'a S,
    config: SmokeConfig,
}

impl<'a, S: SmokeSender + ?Sized> StartupSmokeProducer<'a, S> {
    pub fn new(sender: &'a S, config: SmokeConfig) -> Self {
        Self { sender, config }
    }

    /// Single attempt. Every failure is logged and returned as
    /// [`ExitOutcome::Failed`].
    pub async fn run(&self) -> ExitOutcome {
        match self.try_run().await {
            Ok(outcome) => outcome,
            Err(e) => ExitOutcome::failed(e),
        }
    }

    async fn try_run(&self) -> Result<ExitOutcome> {
        let topic = self.config.validate_topic()?;

        info!(
            topic = %topic,
            wait_for_ack = self.config.wait_for_ack,
            exit_after_send = self.config.exit_after_send,
            bootstrap = %self.config.kafka.bootstrap_display(),
            "MODE=startup-smoke enabled=true"
        );

        let message = SmokeMessage::new();

        let delivery = if self.config.awaits_ack() {
            if !self.config.wait_for_ack {
                warn!("waitForAck=false requested, but the acknowledgment is still awaited for run-once reliability");
            }

            let delivery = self
                .sender
                .send_and_wait(topic, &message.key, &message.value, self.config.ack_timeout)
                .await?;

            info!(
                topic = %delivery.topic,
                partition = delivery.partition,
                offset = delivery.offset,
                key = %message.key,
                value = %message.value,
                "SENT ack=true"
            );
            Some(delivery)
        } else {
            self.sender
                .send_no_wait(topic, &message.key, &message.value)?;

            info!(
                topic = %topic,
                key = %message.key,
                value = %message.value,
                "SENT ack=false (send initiated, delivery not confirmed)"
            );
            None
        };

        info!("DONE produced=1 exitCode=0");

        if !self.config.exit_after_send {
            info!("Exit-after-send is false. Process will keep running.");
        }

        Ok(ExitOutcome::Succeeded {
            message,
            delivery,
            exit: self.config.exit_after_send,
        })
    }
}

/// The outcome of a startup run together with the client that still has to
/// be flushed, if one was created.
pub struct StartupRun<S> {
    pub outcome: ExitOutcome,
    pub sender: Option<S>,
    pub flush_timeout: Duration,
}

impl<S: SmokeSender> StartupRun<S> {
    /// A run that failed before any client existed.
    pub fn failed(error: Error) -> Self {
        Self::without_client(ExitOutcome::failed(error))
    }

    fn without_client(outcome: ExitOutcome) -> Self {
        Self {
            outcome,
            sender: None,
            flush_timeout: Duration::from_millis(DEFAULT_ACK_TIMEOUT_MS),
        }
    }

    /// Flushes the client before the process terminates and hands back
    /// `exit_code`.
    pub fn shutdown(&self, exit_code: i32) -> i32 {
        if let Some(sender) = &self.sender {
            if let Err(e) = sender.flush(self.flush_timeout) {
                warn!(error = %e, "Producer flush did not complete before shutdown");
            }
        }

        info!(exit_code, produced = self.outcome.produced(), "Shutting down");
        exit_code
    }
}

/// Guard, configuration, client creation and the single send.
///
/// `connect` is only called for an enabled run whose configuration is valid,
/// so a disabled or misconfigured run never touches the broker.
pub async fn run_from<S, F>(source: &dyn PropertySource, connect: F) -> StartupRun<S>
where
    S: SmokeSender,
    F: FnOnce(&SmokeConfig) -> Result<S>,
{
    if !SmokeConfig::is_enabled(source) {
        info!("Startup smoke producer disabled ({} is not true)", ENABLED_KEY);
        return StartupRun::without_client(ExitOutcome::Skipped);
    }

    let config = match SmokeConfig::load(source).and_then(|config| {
        config.validate_topic()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => return StartupRun::failed(e),
    };

    let sender = match connect(&config) {
        Ok(sender) => sender,
        Err(e) => return StartupRun::failed(e),
    };

    let flush_timeout = config.ack_timeout;
    let outcome = StartupSmokeProducer::new(&sender, config).run().await;

    StartupRun {
        outcome,
        sender: Some(sender),
        flush_timeout,
    }
}

/// Keeps the process alive until Ctrl+C.
///
/// Resolves to [`Error::Shutdown`] when the signal arrives.
pub async fn keep_alive() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Err(Error::Shutdown)
}
