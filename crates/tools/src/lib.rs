//! Developer tooling: the `#debug` panel and a read-only scene inspector.
//!
//! # Invariants
//! - The panel exists only when the location hash is exactly `#debug`.
//! - Tools never mutate the scene; edits surface as `ControlChange`s that the
//!   owner of each value applies.

mod inspector;
mod panel;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};
pub use panel::{
    ControlChange, ControlId, ControlValue, DEBUG_HASH, DebugPanel, FolderId, PANEL_TITLE,
    PANEL_WIDTH,
};

pub fn crate_info() -> &'static str {
    "experience-tools v0.1.0"
}
