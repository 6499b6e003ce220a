//! Analysis logic for runtime extension data
//!
//! This module contains pure business logic for joining extension snapshots
//! and aggregating profile traces, separated from the TUI presentation layer.

pub mod resolver;
pub mod segmenter;

pub use resolver::{
    compare_by_profile_time, resolve, sort_by_profile_time, MarketplaceIndex,
    RuntimeExtensionRecord, StatusMap,
};
pub use segmenter::{ProfileSegments, Segment, SegmentedTrace};
