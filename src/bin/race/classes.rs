//! Built-in actor classes a configuration file's `class` field can select.
//!
//! The core has no `dyn Actor` plugin mechanism (every actor type is
//! monomorphized into `Master::create`), so this binary only ever offers a
//! small, closed set of generic classes that operate on [`UserPayload`]
//! bytes. A config naming any other class fails validation at startup.

use async_trait::async_trait;
use race_runtime::config::{ActorConfig, ChannelList};
use race_runtime::message::{RaceMessage, UserPayload};
use race_runtime::{Actor, ActorContext, FailurePolicy, Master, RaceError};

fn channels(list: &Option<ChannelList>) -> Vec<String> {
    list.as_ref().map(ChannelList::as_slice_owned).unwrap_or_default()
}

/// Subscribes to `read-from`, republishes every received payload unchanged
/// to `write-to`.
struct EchoActor {
    read_from: Vec<String>,
    write_to: Vec<String>,
}

#[async_trait]
impl Actor for EchoActor {
    type User = UserPayload;
    type Error = RaceError;

    async fn on_start(&mut self, ctx: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        for channel in &self.read_from {
            ctx.subscribe(channel.clone());
        }
        Ok(())
    }

    async fn handle_message(&mut self, message: RaceMessage<Self::User>, ctx: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        if let RaceMessage::Bus(event) = message {
            for channel in &self.write_to {
                ctx.publish(channel, event.payload.clone()).await;
            }
        }
        Ok(())
    }
}

/// Subscribes to `read-from`, logs every received payload at `info` and
/// forwards nothing. `write-to` is ignored.
struct LoggerActor {
    read_from: Vec<String>,
}

#[async_trait]
impl Actor for LoggerActor {
    type User = UserPayload;
    type Error = RaceError;

    async fn on_start(&mut self, ctx: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        for channel in &self.read_from {
            ctx.subscribe(channel.clone());
        }
        Ok(())
    }

    async fn handle_message(&mut self, message: RaceMessage<Self::User>, _ctx: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        if let RaceMessage::Bus(event) = message {
            tracing::info!(
                channel = %event.channel,
                sender = %event.sender,
                type_id = %event.payload.type_id,
                bytes = event.payload.bytes.len(),
                "received"
            );
        }
        Ok(())
    }
}

/// Subscribes to `read-from`, tags the payload's `type_id` as relayed and
/// republishes it to `write-to`.
struct RelayActor {
    read_from: Vec<String>,
    write_to: Vec<String>,
}

#[async_trait]
impl Actor for RelayActor {
    type User = UserPayload;
    type Error = RaceError;

    async fn on_start(&mut self, ctx: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        for channel in &self.read_from {
            ctx.subscribe(channel.clone());
        }
        Ok(())
    }

    async fn handle_message(&mut self, message: RaceMessage<Self::User>, ctx: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        if let RaceMessage::Bus(event) = message {
            let relayed = UserPayload {
                type_id: format!("relayed:{}", event.payload.type_id),
                bytes: event.payload.bytes,
            };
            for channel in &self.write_to {
                ctx.publish(channel, relayed.clone()).await;
            }
        }
        Ok(())
    }
}

/// Builds and registers the actor named by `config.class`, or fails with
/// `ConfigurationError` if the name isn't one of the classes above.
pub fn spawn(master: &Master<UserPayload>, config: &ActorConfig) -> Result<(), RaceError> {
    let policy = FailurePolicy::from(config.failure_policy);
    let read_from = channels(&config.read_from);
    let write_to = channels(&config.write_to);

    match config.class.as_str() {
        "echo" => {
            master.create(EchoActor { read_from, write_to }, config.name.clone(), config.mailbox_capacity, policy);
        }
        "logger" => {
            master.create(LoggerActor { read_from }, config.name.clone(), config.mailbox_capacity, policy);
        }
        "relay" => {
            master.create(RelayActor { read_from, write_to }, config.name.clone(), config.mailbox_capacity, policy);
        }
        other => {
            return Err(RaceError::ConfigurationError {
                reason: format!("actor `{}` names unknown class `{other}`", config.name),
            })
        }
    }
    Ok(())
}
