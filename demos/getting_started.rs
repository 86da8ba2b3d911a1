//! Getting Started - Your First Actor
//!
//! Builds a counter actor, drives it through the phase protocol with
//! `Master`, and talks to it both by direct `tell`/`ask` and by publishing
//! on the bus. Run with: cargo run --example getting_started

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use race_runtime::message::RaceMessage;
use race_runtime::{Actor, ActorContext, Clock, FailurePolicy, Master, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum CounterMessage {
    Increment,
    Decrement,
    GetValue,
    CurrentValue(i32),
}

impl Message for CounterMessage {
    const MESSAGE_TYPE: &'static str = "counter";
}

#[derive(Debug)]
struct CounterError(String);

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "counter error: {}", self.0)
    }
}

impl std::error::Error for CounterError {}

struct CounterActor {
    value: i32,
}

#[async_trait]
impl Actor for CounterActor {
    type User = CounterMessage;
    type Error = CounterError;

    async fn handle_message(
        &mut self,
        message: RaceMessage<Self::User>,
        context: &mut ActorContext<Self::User>,
    ) -> Result<(), Self::Error> {
        let payload = match message {
            RaceMessage::User(payload) => payload,
            RaceMessage::Bus(event) => event.payload,
            _ => return Ok(()),
        };

        match payload {
            CounterMessage::Increment => {
                self.value += 1;
                println!("   counter incremented to {}", self.value);
            }
            CounterMessage::Decrement => {
                self.value -= 1;
                println!("   counter decremented to {}", self.value);
            }
            CounterMessage::GetValue => {
                context
                    .reply(CounterMessage::CurrentValue(self.value))
                    .await
                    .map_err(|e| CounterError(e.to_string()))?;
            }
            CounterMessage::CurrentValue(_) => {}
        }

        Ok(())
    }

    async fn on_initialize(&mut self, context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        context.subscribe("/counter/events");
        Ok(())
    }
}

/// Drives the counter through a short demo sequence once started, then
/// prints what it learned back via `ask`.
struct ClientActor {
    counter: race_runtime::ActorAddress,
}

#[async_trait]
impl Actor for ClientActor {
    type User = CounterMessage;
    type Error = CounterError;

    async fn handle_message(
        &mut self,
        _message: RaceMessage<Self::User>,
        _context: &mut ActorContext<Self::User>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn on_start(&mut self, context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        println!("2. Sending direct messages...");
        context
            .tell(&self.counter, CounterMessage::Increment)
            .await
            .map_err(|e| CounterError(e.to_string()))?;
        context
            .tell(&self.counter, CounterMessage::Increment)
            .await
            .map_err(|e| CounterError(e.to_string()))?;
        context
            .tell(&self.counter, CounterMessage::Decrement)
            .await
            .map_err(|e| CounterError(e.to_string()))?;

        let reply = context
            .ask(&self.counter, CounterMessage::GetValue, Duration::from_secs(1))
            .await
            .map_err(|e| CounterError(e.to_string()))?;
        println!("   counter reports its value as {reply:?}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Getting Started ===\n");

    let master = Master::<CounterMessage>::new(Clock::new(Utc::now(), 1.0), Duration::from_secs(5));
    let counter = master.create(CounterActor { value: 0 }, "counter", 32, FailurePolicy::Critical);
    master.create(ClientActor { counter: counter.clone() }, "client", 8, FailurePolicy::Optional);

    println!("1. Bringing the actors up...");
    master.initialize_all().await?;
    master.start_all().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n3. Publishing a bus event the counter subscribed to...");
    master
        .bus()
        .publish("/counter/events", CounterMessage::Increment, counter.clone())
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\n4. Shutting down...");
    master.terminate_all().await;

    println!("\n=== Complete ===");
    Ok(())
}
