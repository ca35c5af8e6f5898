//! BGM layout compiler.

use super::{Filter, FadeKind, FilterGraph, MixDuration, Stage, StreamLabel};
use crate::error::LayoutError;
use crate::layout::BgmSegment;

/// Label of the final mix stage.
pub const MIX_LABEL: &str = "mix";

/// Compile BGM segments into one mixing graph.
///
/// Segment `i` is read from engine input `i + 1`; input 0 is the main track,
/// referenced by `main`. Each segment is trimmed, faded, scaled and delayed
/// into place, then everything is mixed over the main track. The main track
/// decides the output length.
pub fn compile_bgm(main: &StreamLabel, segments: &[BgmSegment]) -> Result<FilterGraph, LayoutError> {
    if segments.is_empty() {
        return Err(LayoutError::NoSegments);
    }

    let mut stages = Vec::with_capacity(segments.len() + 1);
    let mut mix_inputs = vec![main.clone()];

    for (i, segment) in segments.iter().enumerate() {
        let stage = segment_stage(i, segment)?;
        mix_inputs.push(stage.output.clone());
        stages.push(stage);
    }

    let output = StreamLabel::named(MIX_LABEL);
    stages.push(Stage::new(
        mix_inputs,
        vec![Filter::Mix {
            inputs: segments.len() + 1,
            duration: MixDuration::First,
            dropout_transition: 0.0,
        }],
        output.clone(),
    ));

    Ok(FilterGraph::new(stages, output))
}

fn segment_stage(i: usize, segment: &BgmSegment) -> Result<Stage, LayoutError> {
    let duration = segment.duration();
    if duration <= 0.0 {
        return Err(LayoutError::NonPositiveDuration {
            index: i + 1,
            duration,
        });
    }

    let mut filters = vec![
        Filter::Trim {
            start: Some(segment.source_offset),
            end: None,
            duration: Some(duration),
        },
        Filter::ResetTimestamps,
    ];
    if segment.fade_in > 0.0 {
        filters.push(Filter::Fade {
            kind: FadeKind::In,
            start: 0.0,
            duration: segment.effective_fade_in(),
        });
    }
    if segment.fade_out > 0.0 {
        filters.push(Filter::Fade {
            kind: FadeKind::Out,
            start: segment.fade_out_start(),
            duration: segment.effective_fade_out(),
        });
    }
    filters.push(Filter::Volume(segment.gain));
    filters.push(Filter::Delay {
        millis: segment.delay_ms(),
    });

    Ok(Stage::new(
        vec![StreamLabel::input(i + 1)],
        filters,
        StreamLabel::named(format!("bgm{i}")),
    ))
}
