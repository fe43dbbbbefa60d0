use serde::{Deserialize, Serialize};

use crate::error::{DurationField, PlanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Run,
    Walk,
}

impl SegmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            SegmentKind::Run => "Run",
            SegmentKind::Walk => "Walk",
        }
    }
}

/// One atomic work or rest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub duration_secs: u64,
}

impl Segment {
    fn run(duration_secs: u64) -> Self {
        Self {
            kind: SegmentKind::Run,
            duration_secs,
        }
    }

    fn walk(duration_secs: u64) -> Self {
        Self {
            kind: SegmentKind::Walk,
            duration_secs,
        }
    }
}

/// The three session fields, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionInputs {
    pub total_min: f64,
    pub run_min: f64,
    pub walk_min: f64,
}

impl SessionInputs {
    pub fn new(total_min: f64, run_min: f64, walk_min: f64) -> Self {
        Self {
            total_min,
            run_min,
            walk_min,
        }
    }

    /// Parse the raw text of the three input fields.
    pub fn parse(total: &str, run: &str, walk: &str) -> Result<Self, PlanError> {
        Ok(Self {
            total_min: parse_minutes(DurationField::Total, total)?,
            run_min: parse_minutes(DurationField::Run, run)?,
            walk_min: parse_minutes(DurationField::Walk, walk)?,
        })
    }
}

fn parse_minutes(field: DurationField, raw: &str) -> Result<f64, PlanError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| PlanError::InvalidDuration {
            field,
            value: raw.to_string(),
        })
}

/// Longest accepted duration. Keeps `run + walk` and the pair arithmetic
/// well inside `u64`.
const MAX_DURATION_SECS: f64 = (u64::MAX / 4) as f64;

/// Convert minutes to whole seconds, rejecting anything that is not a
/// positive finite duration of at least one second.
fn to_seconds(field: DurationField, minutes: f64) -> Result<u64, PlanError> {
    let secs = (minutes * 60.0).round();
    if !minutes.is_finite() || minutes <= 0.0 || secs < 1.0 || secs > MAX_DURATION_SECS {
        return Err(PlanError::InvalidDuration {
            field,
            value: minutes.to_string(),
        });
    }
    Ok(secs as u64)
}

/// Upper bound on segments in one plan.
pub const MAX_SEGMENTS: u64 = 100_000;

/// Ordered sequence of segments for one session. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    segments: Vec<Segment>,
}

impl Plan {
    /// Build the run/walk plan for the given inputs.
    ///
    /// Full run+walk pairs are emitted while they fit, then one more full
    /// run if it fits, and any leftover becomes a final, shorter walk. A
    /// total shorter than a single run yields one truncated run.
    pub fn build(inputs: &SessionInputs) -> Result<Self, PlanError> {
        let total = to_seconds(DurationField::Total, inputs.total_min)?;
        let run = to_seconds(DurationField::Run, inputs.run_min)?;
        let walk = to_seconds(DurationField::Walk, inputs.walk_min)?;

        if total < run {
            return Ok(Self {
                segments: vec![Segment::run(total)],
            });
        }

        let pairs = total / (run + walk);
        if pairs.saturating_mul(2) > MAX_SEGMENTS {
            return Err(PlanError::TooManySegments {
                segments: pairs.saturating_mul(2),
                max: MAX_SEGMENTS,
            });
        }
        let mut segments = Vec::with_capacity(pairs as usize * 2 + 2);
        for _ in 0..pairs {
            segments.push(Segment::run(run));
            segments.push(Segment::walk(walk));
        }

        let mut remaining = total - pairs * (run + walk);
        if remaining >= run {
            segments.push(Segment::run(run));
            remaining -= run;
        }
        if remaining > 0 {
            segments.push(Segment::walk(remaining));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn total_secs(&self) -> u64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }

    /// Cumulative seconds up to (but not including) `index`.
    pub fn cumulative_secs(&self, index: usize) -> u64 {
        self.segments
            .iter()
            .take(index)
            .map(|s| s.duration_secs)
            .sum()
    }
}
