//! Channel-topic negotiation protocol: on-demand activation of a
//! (channel, topic) pair between a provider actor and consumer actors.
//!
//! State tracking follows the same DashMap-per-key shape as
//! [`crate::bus::Bus`] rather than a single global lock, since unrelated
//! (channel, topic) pairs should never contend with each other.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use rand::Rng;

// Layer 3: Internal module imports
use crate::util::ActorAddress;

/// Identifies a negotiable (channel, topic) pair. `topic` is `None` when a
/// channel has no sub-topic distinction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelTopic {
    pub channel: String,
    pub topic: Option<String>,
}

impl ChannelTopic {
    pub fn new(channel: impl Into<String>, topic: Option<String>) -> Self {
        Self {
            channel: channel.into(),
            topic,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PairState {
    /// Providers that responded to a request and are available to serve it.
    offered: Vec<ActorAddress>,
    /// The provider currently activated for this pair, if any.
    active_provider: Option<ActorAddress>,
    /// Consumers with an accepted, active subscription to this pair.
    active_consumers: HashSet<ActorAddress>,
}

/// Tracks provider/consumer negotiation state for every (channel, topic)
/// pair seen so far.
pub struct TopicRegistry {
    pairs: Arc<DashMap<ChannelTopic, PairState>>,
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TopicRegistry {
    fn clone(&self) -> Self {
        Self {
            pairs: Arc::clone(&self.pairs),
        }
    }
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self {
            pairs: Arc::new(DashMap::new()),
        }
    }

    /// Record that `provider` offered to serve `pair` in response to a
    /// request. Multiple providers may offer; the consumer picks one via
    /// [`TopicRegistry::accept`].
    pub fn offer(&self, pair: ChannelTopic, provider: ActorAddress) {
        let mut state = self.pairs.entry(pair).or_default();
        if !state.offered.contains(&provider) {
            state.offered.push(provider);
        }
    }

    /// Activate `pair` for `provider` and record `consumer` as subscribed.
    /// Returns `true` if this is the first consumer to accept this
    /// provider for this pair (the provider should start publishing).
    pub fn accept(&self, pair: ChannelTopic, provider: ActorAddress, consumer: ActorAddress) -> bool {
        let mut state = self.pairs.entry(pair).or_default();
        let first_activation = state.active_provider.is_none();
        state.active_provider = Some(provider);
        state.active_consumers.insert(consumer);
        first_activation
    }

    /// Release `consumer`'s interest in `pair`. Returns `true` if this was
    /// the last consumer, meaning the provider can stop publishing.
    pub fn release(&self, pair: &ChannelTopic, consumer: &ActorAddress) -> bool {
        if let Some(mut state) = self.pairs.get_mut(pair) {
            state.active_consumers.remove(consumer);
            if state.active_consumers.is_empty() {
                state.active_provider = None;
                return true;
            }
        }
        false
    }

    /// Handle an involuntary release (provider crash): clears the active
    /// provider and every consumer for `pair`, returning the consumers that
    /// were dropped so the caller can notify them.
    pub fn provider_crashed(&self, pair: &ChannelTopic, provider: &ActorAddress) -> Vec<ActorAddress> {
        if let Some(mut state) = self.pairs.get_mut(pair) {
            if state.active_provider.as_ref() == Some(provider) {
                state.active_provider = None;
                state.offered.retain(|p| p != provider);
                return state.active_consumers.drain().collect();
            }
        }
        Vec::new()
    }

    /// Providers that have offered `pair` and have not crashed, in offer
    /// order. Used to pick a replacement when the active provider dies.
    pub fn offers(&self, pair: &ChannelTopic) -> Vec<ActorAddress> {
        self.pairs.get(pair).map(|s| s.offered.clone()).unwrap_or_default()
    }

    /// Currently active provider for `pair`, if the pair is activated.
    pub fn active_provider(&self, pair: &ChannelTopic) -> Option<ActorAddress> {
        self.pairs.get(pair).and_then(|s| s.active_provider.clone())
    }

    /// Whether `pair` currently has at least one accepted consumer.
    pub fn is_active(&self, pair: &ChannelTopic) -> bool {
        self.pairs
            .get(pair)
            .map(|s| !s.active_consumers.is_empty())
            .unwrap_or(false)
    }

    /// Picks a replacement provider for `pair` at random among those that
    /// have offered it, so repeated failovers don't always land on the same
    /// provider when several are available.
    pub fn pick_provider(&self, pair: &ChannelTopic) -> Option<ActorAddress> {
        let pool = self.offers(pair);
        if pool.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..pool.len());
        pool.into_iter().nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> ActorAddress {
        ActorAddress::local(name)
    }

    #[test]
    fn pick_provider_returns_none_with_no_offers() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        assert!(registry.pick_provider(&pair).is_none());
    }

    #[test]
    fn pick_provider_returns_one_of_the_offered_providers() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        let (a, b) = (addr("a"), addr("b"));
        registry.offer(pair.clone(), a.clone());
        registry.offer(pair.clone(), b.clone());

        let picked = registry.pick_provider(&pair).unwrap();
        assert!(picked == a || picked == b);
    }

    #[test]
    fn first_accept_activates_and_reports_first_activation() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        registry.offer(pair.clone(), addr("provider"));

        let first = registry.accept(pair.clone(), addr("provider"), addr("consumer-a"));
        assert!(first);
        assert!(registry.is_active(&pair));
    }

    #[test]
    fn second_consumer_accepting_does_not_reactivate() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        registry.accept(pair.clone(), addr("provider"), addr("consumer-a"));
        let second = registry.accept(pair.clone(), addr("provider"), addr("consumer-b"));
        assert!(!second);
    }

    #[test]
    fn release_by_last_consumer_deactivates() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        registry.accept(pair.clone(), addr("provider"), addr("consumer-a"));

        let was_last = registry.release(&pair, &addr("consumer-a"));
        assert!(was_last);
        assert!(!registry.is_active(&pair));
    }

    #[test]
    fn release_with_remaining_consumers_keeps_active() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        registry.accept(pair.clone(), addr("provider"), addr("consumer-a"));
        registry.accept(pair.clone(), addr("provider"), addr("consumer-b"));

        let was_last = registry.release(&pair, &addr("consumer-a"));
        assert!(!was_last);
        assert!(registry.is_active(&pair));
    }

    #[test]
    fn provider_crash_drops_all_consumers_and_clears_active_provider() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        registry.accept(pair.clone(), addr("provider"), addr("consumer-a"));
        registry.accept(pair.clone(), addr("provider"), addr("consumer-b"));

        let dropped = registry.provider_crashed(&pair, &addr("provider"));
        assert_eq!(dropped.len(), 2);
        assert!(registry.active_provider(&pair).is_none());
    }

    #[test]
    fn late_joining_consumer_sees_existing_provider() {
        let registry = TopicRegistry::new();
        let pair = ChannelTopic::new("/radar/track", None);
        registry.accept(pair.clone(), addr("provider"), addr("consumer-a"));

        registry.accept(pair.clone(), addr("provider"), addr("consumer-late"));
        assert_eq!(registry.active_provider(&pair), Some(addr("provider")));
    }
}
