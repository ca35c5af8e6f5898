//! Graphs for destructive edits and plain concatenation.

use super::{Filter, FilterGraph, Stage, StreamLabel};

const OUT_LABEL: &str = "out";

/// Remove `[start, end)` from input 0 and close the gap.
///
/// Callers validate the range; a zero-length head (`start == 0`) is left
/// out of the concatenation rather than passed to the engine as an empty trim.
pub fn delete_range(start: f64, end: f64) -> FilterGraph {
    let mut pieces = Vec::with_capacity(2);
    if start > 0.0 {
        pieces.push(head(start, "a"));
    }
    pieces.push(tail(end, "b"));
    join(pieces)
}

/// Replace `[start, end)` of input 0 with all of input 1.
///
/// The replacement is used in full, so the result is
/// `start + len(replacement) + (original - end)` long.
pub fn punch_in(start: f64, end: f64) -> FilterGraph {
    let mut pieces = Vec::with_capacity(3);
    if start > 0.0 {
        pieces.push(head(start, "head"));
    }
    pieces.push(Stage::new(
        vec![StreamLabel::input(1)],
        vec![Filter::ResetTimestamps],
        StreamLabel::named("clip"),
    ));
    pieces.push(tail(end, "tail"));
    join(pieces)
}

/// Concatenate the audio of the first `count` inputs in order.
pub fn concat_inputs(count: usize) -> FilterGraph {
    let output = StreamLabel::named(OUT_LABEL);
    let stage = Stage::new(
        (0..count).map(StreamLabel::input).collect(),
        vec![Filter::Concat { segments: count }],
        output.clone(),
    );
    FilterGraph::new(vec![stage], output)
}

fn head(end: f64, label: &str) -> Stage {
    Stage::new(
        vec![StreamLabel::input(0)],
        vec![
            Filter::Trim {
                start: None,
                end: Some(end),
                duration: None,
            },
            Filter::ResetTimestamps,
        ],
        StreamLabel::named(label),
    )
}

fn tail(start: f64, label: &str) -> Stage {
    Stage::new(
        vec![StreamLabel::input(0)],
        vec![
            Filter::Trim {
                start: Some(start),
                end: None,
                duration: None,
            },
            Filter::ResetTimestamps,
        ],
        StreamLabel::named(label),
    )
}

fn join(mut pieces: Vec<Stage>) -> FilterGraph {
    let output = StreamLabel::named(OUT_LABEL);
    let inputs: Vec<StreamLabel> = pieces.iter().map(|p| p.output.clone()).collect();
    pieces.push(Stage::new(
        inputs.clone(),
        vec![Filter::Concat {
            segments: inputs.len(),
        }],
        output.clone(),
    ));
    FilterGraph::new(pieces, output)
}
