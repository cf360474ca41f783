//! High-level helpers that combine decoding and event building.

use crate::array::DetectorArray;
use crate::builder::{BuildStatistics, EventBuilder};
use hitbuilder_core::{AnalysisOptions, ChannelMap, DetectorEvent, DetectorHit, RawFragment};
use rayon::prelude::*;

/// One element of an array's input stream.
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// Raw fragment to decode.
    Fragment(RawFragment),
    /// Already decoded hit.
    Hit(DetectorHit),
    /// Trigger boundary (closes the event when building by trigger).
    Trigger,
}

/// Events built from one stream, with the builder's counters.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Closed events in stream order.
    pub events: Vec<DetectorEvent>,
    /// Builder counters for the stream.
    pub statistics: BuildStatistics,
}

/// Decodes and correlates a whole stream for `array`.
///
/// Fragments tagged with another array are skipped. The output always holds
/// at least one event: an empty stream yields a single empty event.
pub fn build_events<I>(
    array: &dyn DetectorArray,
    channels: &ChannelMap,
    options: &AnalysisOptions,
    items: I,
) -> BuildOutput
where
    I: IntoIterator<Item = StreamItem>,
{
    let mut builder = EventBuilder::new(array, channels, options);
    let mut events = Vec::new();

    for item in items {
        let closed = match item {
            StreamItem::Fragment(fragment) => {
                if fragment.array != array.kind() {
                    log::debug!(
                        "skipping {} fragment on channel {} in {} stream",
                        fragment.array,
                        fragment.channel,
                        array.kind()
                    );
                    continue;
                }
                let hit = array.decode(&fragment, channels.get(fragment.channel), options);
                builder.push(hit)
            }
            StreamItem::Hit(hit) => builder.push(hit),
            StreamItem::Trigger => builder.trigger(),
        };
        events.extend(closed);
    }
    events.extend(builder.finish());

    if events.is_empty() {
        events.push(DetectorEvent::new());
    }

    BuildOutput {
        events,
        statistics: builder.statistics(),
    }
}

/// Decodes fragments and builds events without trigger boundaries.
pub fn decode_and_build(
    array: &dyn DetectorArray,
    channels: &ChannelMap,
    options: &AnalysisOptions,
    fragments: &[RawFragment],
) -> BuildOutput {
    build_events(
        array,
        channels,
        options,
        fragments.iter().cloned().map(StreamItem::Fragment),
    )
}

/// Input for one array in a multi-array run.
pub struct ArrayStream<'a> {
    /// Array the stream belongs to.
    pub array: &'a dyn DetectorArray,
    /// Channel records for the array.
    pub channels: &'a ChannelMap,
    /// Stream in acquisition order.
    pub items: Vec<StreamItem>,
}

/// Builds events for several arrays concurrently.
///
/// Each array gets its own builder; the options are shared read-only.
/// Results are returned in input order.
pub fn build_arrays_parallel(
    streams: Vec<ArrayStream<'_>>,
    options: &AnalysisOptions,
) -> Vec<BuildOutput> {
    streams
        .into_par_iter()
        .map(|stream| build_events(stream.array, stream.channels, options, stream.items))
        .collect()
}
