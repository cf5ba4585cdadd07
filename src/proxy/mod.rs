//! Public HTTP proxy support.
//!
//! - [`ProxyEndpoint`] / [`ProxyMapping`]: endpoint identity and routing form
//! - [`ProxyProbe`]: per-candidate validation result
//! - [`ProxyPool`]: two-stage validated pool with rotation and eviction
//!
//! Public proxies are volatile; the pool is best-effort and callers always
//! keep a direct path available.

mod endpoint;
mod pool;
mod probe;
mod source;

pub use endpoint::{ProxyEndpoint, ProxyMapping};
pub use pool::{rank_survivors, BuildCounts, ProxyPool, ProxyPoolBuild, ProxySource};
pub use probe::{
    validate_proxy_custom, validate_proxy_generic, ProbeStage, ProbeVerdict, ProxyProbe,
    TargetProbe,
};
pub use source::{fetch_proxy_list, parse_proxy_list};
