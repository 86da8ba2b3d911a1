//! Channel-Topic Negotiation
//!
//! A provider offers a (channel, topic) pair; a consumer accepts it,
//! activating the pair and telling the provider to start publishing. When
//! the consumer releases its interest, the provider is told it can stand
//! down. Run with: cargo run --example channel_topic_negotiation

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use race_runtime::message::RaceMessage;
use race_runtime::{Actor, ActorContext, Clock, FailurePolicy, Master, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TrackMessage {
    Activate,
    Deactivate,
    Track { id: u32, altitude_ft: u32 },
}

impl Message for TrackMessage {
    const MESSAGE_TYPE: &'static str = "track";
}

#[derive(Debug)]
struct NegotiationError(String);

impl std::fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "negotiation error: {}", self.0)
    }
}

impl std::error::Error for NegotiationError {}

/// Offers `/tracks/enroute` and only starts publishing once a consumer has
/// accepted the offer.
struct TrackProvider {
    publishing: bool,
}

#[async_trait]
impl Actor for TrackProvider {
    type User = TrackMessage;
    type Error = NegotiationError;

    async fn handle_message(
        &mut self,
        message: RaceMessage<Self::User>,
        context: &mut ActorContext<Self::User>,
    ) -> Result<(), Self::Error> {
        match message {
            RaceMessage::User(TrackMessage::Activate) => {
                self.publishing = true;
                println!("   [provider] activated, publishing tracks");
                context.publish("/tracks/enroute", TrackMessage::Track { id: 1, altitude_ft: 35_000 }).await;
            }
            RaceMessage::User(TrackMessage::Deactivate) => {
                self.publishing = false;
                println!("   [provider] deactivated, standing down");
            }
            _ => {}
        }
        Ok(())
    }

    async fn on_initialize(&mut self, context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        let pair = context.request_topic("/tracks/enroute", Some("enroute".into()));
        context.topics().offer(pair, context.address().clone());
        Ok(())
    }
}

/// Accepts the provider's offer, receives its tracks, then releases.
struct TrackConsumer {
    provider: race_runtime::ActorAddress,
}

#[async_trait]
impl Actor for TrackConsumer {
    type User = TrackMessage;
    type Error = NegotiationError;

    async fn handle_message(
        &mut self,
        message: RaceMessage<Self::User>,
        _context: &mut ActorContext<Self::User>,
    ) -> Result<(), Self::Error> {
        if let RaceMessage::Bus(event) = message {
            if let TrackMessage::Track { id, altitude_ft } = event.payload {
                println!("   [consumer] received track {id} at {altitude_ft} ft");
            }
        }
        Ok(())
    }

    async fn on_start(&mut self, context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        context.subscribe("/tracks/enroute");
        let pair = context.request_topic("/tracks/enroute", Some("enroute".into()));
        let first_activation = context.topics().accept(pair, self.provider.clone(), context.address().clone());
        if first_activation {
            context
                .tell(&self.provider, TrackMessage::Activate)
                .await
                .map_err(|e| NegotiationError(e.to_string()))?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Channel-Topic Negotiation ===\n");

    let master = Master::<TrackMessage>::new(Clock::new(Utc::now(), 1.0), Duration::from_secs(5));
    let provider = master.create(TrackProvider { publishing: false }, "provider", 16, FailurePolicy::Critical);
    master.create(TrackConsumer { provider: provider.clone() }, "consumer", 16, FailurePolicy::Optional);

    println!("1. Bringing provider and consumer up...");
    master.initialize_all().await?;
    master.start_all().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n2. Shutting down...");
    master.terminate_all().await;

    println!("\n=== Complete ===");
    Ok(())
}
