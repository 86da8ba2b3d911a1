//! Configuration-file loading for `race`-graphs: RON on disk, `${var}`
//! substitution and `include` directives as a text preprocessing pass,
//! then validation against the rules §6/§9 name.

pub mod load;
pub mod model;
pub mod preprocess;
pub mod validate;

pub use load::load_graph_config;
pub use model::{ActorConfig, ChannelList, FailurePolicyConfig, GraphConfig, PausePolicy};
pub use validate::validate;
