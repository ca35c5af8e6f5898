//! Typed filter graphs
//!
//! A [`FilterGraph`] is an ordered list of [`Stage`]s. Each stage reads one
//! or more labelled streams, runs a chain of [`Filter`]s and publishes one
//! labelled stream. One stage output is designated as the graph output and
//! is what the engine maps to the output file.
//!
//! The model is kept separate from its text form so clamping and ordering
//! can be checked on values; [`FilterGraph::to_filter_complex`] is the only
//! place that knows the engine's syntax.

mod compile;
mod edit;

pub use compile::{compile_bgm, MIX_LABEL};
pub use edit::{concat_inputs, delete_range, punch_in};

use std::fmt;

/// A stream label. Input pads are named `<index>:a`, everything else by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamLabel(String);

impl StreamLabel {
    /// Audio stream of the `index`-th engine input.
    pub fn input(index: usize) -> Self {
        Self(format!("{index}:a"))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeKind {
    In,
    Out,
}

/// How `amix` decides the output length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixDuration {
    Longest,
    Shortest,
    /// Stop when the first input ends.
    First,
}

impl MixDuration {
    fn as_str(&self) -> &'static str {
        match self {
            MixDuration::Longest => "longest",
            MixDuration::Shortest => "shortest",
            MixDuration::First => "first",
        }
    }
}

/// One audio filter with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Keep `[start, end)`, or `duration` seconds from `start`.
    Trim {
        start: Option<f64>,
        end: Option<f64>,
        duration: Option<f64>,
    },
    /// Reset timestamps so the stream starts at zero.
    ResetTimestamps,
    Fade {
        kind: FadeKind,
        start: f64,
        duration: f64,
    },
    Volume(f64),
    /// Delay every channel by `millis`.
    Delay { millis: u64 },
    Mix {
        inputs: usize,
        duration: MixDuration,
        dropout_transition: f64,
    },
    Concat { segments: usize },
}

impl Filter {
    /// Engine filter name.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Trim { .. } => "atrim",
            Filter::ResetTimestamps => "asetpts",
            Filter::Fade { .. } => "afade",
            Filter::Volume(_) => "volume",
            Filter::Delay { .. } => "adelay",
            Filter::Mix { .. } => "amix",
            Filter::Concat { .. } => "concat",
        }
    }

    /// Parameters in the order the engine expects them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Filter::Trim {
                start,
                end,
                duration,
            } => {
                let mut params = Vec::new();
                if let Some(start) = start {
                    params.push(("start", start.to_string()));
                }
                if let Some(end) = end {
                    params.push(("end", end.to_string()));
                }
                if let Some(duration) = duration {
                    params.push(("duration", duration.to_string()));
                }
                params
            }
            Filter::ResetTimestamps => vec![("expr", "PTS-STARTPTS".to_string())],
            Filter::Fade {
                kind,
                start,
                duration,
            } => vec![
                (
                    "t",
                    match kind {
                        FadeKind::In => "in",
                        FadeKind::Out => "out",
                    }
                    .to_string(),
                ),
                ("st", start.to_string()),
                ("d", duration.to_string()),
            ],
            Filter::Volume(gain) => vec![("volume", gain.to_string())],
            Filter::Delay { millis } => {
                vec![("delays", millis.to_string()), ("all", "1".to_string())]
            }
            Filter::Mix {
                inputs,
                duration,
                dropout_transition,
            } => vec![
                ("inputs", inputs.to_string()),
                ("duration", duration.as_str().to_string()),
                ("dropout_transition", dropout_transition.to_string()),
            ],
            Filter::Concat { segments } => vec![
                ("n", segments.to_string()),
                ("v", "0".to_string()),
                ("a", "1".to_string()),
            ],
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params();
        if params.is_empty() {
            return f.write_str(self.name());
        }
        let params: Vec<String> = params.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}={}", self.name(), params.join(":"))
    }
}

/// Labelled inputs, a filter chain, one labelled output.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub inputs: Vec<StreamLabel>,
    pub filters: Vec<Filter>,
    pub output: StreamLabel,
}

impl Stage {
    pub fn new(inputs: Vec<StreamLabel>, filters: Vec<Filter>, output: StreamLabel) -> Self {
        Self {
            inputs,
            filters,
            output,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "{input}")?;
        }
        let chain: Vec<String> = self.filters.iter().map(Filter::to_string).collect();
        write!(f, "{}{}", chain.join(","), self.output)
    }
}

/// Compiled graph plus the label the engine maps to its output file.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    stages: Vec<Stage>,
    output: StreamLabel,
}

impl FilterGraph {
    pub fn new(stages: Vec<Stage>, output: StreamLabel) -> Self {
        Self { stages, output }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Label to map to the output file.
    pub fn output(&self) -> &StreamLabel {
        &self.output
    }

    /// The stage producing the graph output.
    pub fn final_stage(&self) -> Option<&Stage> {
        self.stages.iter().rev().find(|s| s.output == self.output)
    }

    /// Text form for the engine's `-filter_complex` argument.
    pub fn to_filter_complex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<String> = self.stages.iter().map(Stage::to_string).collect();
        f.write_str(&stages.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labels() {
        assert_eq!(StreamLabel::input(0).to_string(), "[0:a]");
        assert_eq!(StreamLabel::named("bgm3").to_string(), "[bgm3]");
        assert_eq!(StreamLabel::named("mix").as_str(), "mix");
    }

    #[test]
    fn test_filter_text() {
        let trim = Filter::Trim {
            start: Some(4.0),
            end: None,
            duration: Some(2.5),
        };
        assert_eq!(trim.to_string(), "atrim=start=4:duration=2.5");

        let fade = Filter::Fade {
            kind: FadeKind::Out,
            start: 7.5,
            duration: 2.5,
        };
        assert_eq!(fade.to_string(), "afade=t=out:st=7.5:d=2.5");

        assert_eq!(Filter::Volume(0.25).to_string(), "volume=volume=0.25");
        assert_eq!(Filter::Delay { millis: 1500 }.to_string(), "adelay=delays=1500:all=1");
        assert_eq!(
            Filter::Concat { segments: 2 }.to_string(),
            "concat=n=2:v=0:a=1"
        );
    }

    #[test]
    fn test_stage_and_graph_text() {
        let graph = FilterGraph::new(
            vec![
                Stage::new(
                    vec![StreamLabel::input(0)],
                    vec![Filter::Volume(0.5), Filter::ResetTimestamps],
                    StreamLabel::named("a"),
                ),
                Stage::new(
                    vec![StreamLabel::named("a"), StreamLabel::input(1)],
                    vec![Filter::Concat { segments: 2 }],
                    StreamLabel::named("out"),
                ),
            ],
            StreamLabel::named("out"),
        );

        assert_eq!(
            graph.to_filter_complex(),
            "[0:a]volume=volume=0.5,asetpts=expr=PTS-STARTPTS[a];[a][1:a]concat=n=2:v=0:a=1[out]"
        );
        assert_eq!(graph.final_stage().unwrap().inputs.len(), 2);
    }
}
