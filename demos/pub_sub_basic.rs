//! Publish/Subscribe Basics
//!
//! Shows exact-channel and glob-pattern subscriptions on the bus, and how a
//! publish fans out to every matching subscriber exactly once. Run with:
//! cargo run --example pub_sub_basic

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use race_runtime::message::RaceMessage;
use race_runtime::{Actor, ActorContext, Clock, FailurePolicy, Master, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SensorReading {
    sensor: String,
    value: f64,
}

impl Message for SensorReading {
    const MESSAGE_TYPE: &'static str = "sensor-reading";
}

#[derive(Debug)]
struct SubscriberError;

impl std::fmt::Display for SubscriberError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "subscriber error")
    }
}

impl std::error::Error for SubscriberError {}

/// Subscribes to exactly one channel and prints whatever arrives there.
struct ExactSubscriber {
    label: &'static str,
    channel: &'static str,
}

#[async_trait]
impl Actor for ExactSubscriber {
    type User = SensorReading;
    type Error = SubscriberError;

    async fn handle_message(
        &mut self,
        message: RaceMessage<Self::User>,
        _context: &mut ActorContext<Self::User>,
    ) -> Result<(), Self::Error> {
        if let RaceMessage::Bus(event) = message {
            println!("   [{}] saw {} = {} on {}", self.label, event.payload.sensor, event.payload.value, event.channel);
        }
        Ok(())
    }

    async fn on_initialize(&mut self, context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        context.subscribe(self.channel);
        Ok(())
    }
}

/// Subscribes to a glob pattern covering every sensor under one site.
struct PatternSubscriber {
    label: &'static str,
    pattern: &'static str,
}

#[async_trait]
impl Actor for PatternSubscriber {
    type User = SensorReading;
    type Error = SubscriberError;

    async fn handle_message(
        &mut self,
        message: RaceMessage<Self::User>,
        _context: &mut ActorContext<Self::User>,
    ) -> Result<(), Self::Error> {
        if let RaceMessage::Bus(event) = message {
            println!("   [{}] matched {} via pattern on {}", self.label, event.payload.sensor, event.channel);
        }
        Ok(())
    }

    async fn on_initialize(&mut self, context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        context.subscribe(self.pattern);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Publish/Subscribe Basics ===\n");

    let master = Master::<SensorReading>::new(Clock::new(Utc::now(), 1.0), Duration::from_secs(5));
    let publisher = master.create(
        ExactSubscriber { label: "site-a-only", channel: "/site-a/radar-1" },
        "site-a-only",
        16,
        FailurePolicy::Optional,
    );
    master.create(
        PatternSubscriber { label: "site-a-everything", pattern: "/site-a/*" },
        "site-a-everything",
        16,
        FailurePolicy::Optional,
    );
    master.create(
        ExactSubscriber { label: "site-b-only", channel: "/site-b/radar-1" },
        "site-b-only",
        16,
        FailurePolicy::Optional,
    );

    master.initialize_all().await?;
    master.start_all().await?;

    println!("1. Publishing on /site-a/radar-1 (exact + pattern subscribers both see it)...");
    master
        .bus()
        .publish("/site-a/radar-1", SensorReading { sensor: "radar-1".into(), value: 42.0 }, publisher.clone())
        .await;

    println!("\n2. Publishing on /site-a/radar-2 (only the pattern subscriber sees it)...");
    master
        .bus()
        .publish("/site-a/radar-2", SensorReading { sensor: "radar-2".into(), value: 7.0 }, publisher.clone())
        .await;

    println!("\n3. Publishing on /site-b/radar-1 (only the site-b exact subscriber sees it)...");
    master
        .bus()
        .publish("/site-b/radar-1", SensorReading { sensor: "radar-1".into(), value: 99.0 }, publisher)
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    master.terminate_all().await;

    println!("\n=== Complete ===");
    Ok(())
}
