//! Transform engine (§4.3): compiles matcher/action configurations into a
//! pipeline applied to spans before export, plus the inbound drop predicate
//! consulted by the dispatcher.

pub mod action;
pub mod engine;
pub mod jsonpath;
pub mod matcher;

pub use action::{Action, ActionConfig};
pub use engine::{split_url, TransformEngine, TransformEngineConfig, TransformRuleConfig};
pub use matcher::{CompileError, Direction, Matcher, MatcherConfig, Target};
