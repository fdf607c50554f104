//! Output adapters for finished traversals.
//!
//! - `gml`: attributed graph serialization with the root colored apart
//! - `json`: serde snapshot of nodes and edges
//! - `timeline`: Gource custom-format event log replaying the scan order
//! - `layout` and `svg`: spring layout and static rendering

pub mod gml;
pub mod json;
pub mod layout;
pub mod svg;
pub mod timeline;

pub use self::gml::{save_gml, write_gml};
pub use self::json::GraphSnapshot;
pub use self::layout::{Layout, spring_layout};
pub use self::svg::render_svg;
pub use self::timeline::{TimelineRecord, TimelineWriter};
