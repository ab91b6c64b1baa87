//! Composition root of an experience.
//!
//! [`ExperienceContext`] owns the single active [`Experience`], which wires
//! the viewport, ticker, scene, camera, renderer, asset loader and
//! [`World`] together and is driven by the host through
//! [`Experience::handle`].
//!
//! # Invariants
//! - At most one experience is active per context; repeated construction
//!   returns the same instance.
//! - Load-dependent content is built exactly once, after every resource has
//!   resolved.
//! - After `destroy`, host events make no further calls into the instance.

mod config;
mod context;
mod environment;
mod error;
mod experience;
mod world;

pub use config::{DEFAULT_ENVIRONMENT_MAP, ExperienceConfig};
pub use context::ExperienceContext;
pub use environment::{ENVIRONMENT_INTENSITY, Environment, SUN_INTENSITY, SUN_POSITION};
pub use error::ExperienceError;
pub use experience::{Experience, ExperienceStats, HostEvent};
pub use world::World;

pub fn crate_info() -> &'static str {
    "experience-core v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("core"));
    }
}
