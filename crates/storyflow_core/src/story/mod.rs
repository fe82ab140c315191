//! Branching Story Module
//!
//! Story graph model and playback resolution driven by quiz decision tables.
//! Parts and tables are loaded wholesale, validated once, and then treated
//! as immutable; concurrent playback sessions can share one graph.

pub mod cache;
pub mod graph;
pub mod playback;
pub mod types;

pub use cache::GraphCache;
pub use graph::StoryGraph;
pub use playback::{
    AnswerSource, PathEnd, PathEnumeration, PathPreview, PlaybackSession, Playthrough,
    PlaythroughEnd, Step, StepReason,
};
pub use types::{Part, Scene};

#[cfg(test)]
mod tests;
