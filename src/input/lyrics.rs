use crate::foundation::error::{CadenceError, CadenceResult};

/// A single timed word.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// An ordered run of words displayed together.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LyricLine {
    pub start: f64,
    pub end: f64,
    pub words: Vec<LyricWord>,
}

impl LyricLine {
    /// Build a line spanning its words.
    pub fn from_words(words: Vec<LyricWord>) -> CadenceResult<Self> {
        let (Some(first), Some(last)) = (words.first(), words.last()) else {
            return Err(CadenceError::validation("lyric line must have words"));
        };
        let line = Self {
            start: first.start,
            end: last.end,
            words,
        };
        line.validate()?;
        Ok(line)
    }

    pub fn validate(&self) -> CadenceResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() || self.end <= self.start {
            return Err(CadenceError::validation(format!(
                "lyric line [{}, {}) must have finite start < end",
                self.start, self.end
            )));
        }
        for w in &self.words {
            if !w.start.is_finite() || !w.end.is_finite() || w.end < w.start {
                return Err(CadenceError::validation(format!(
                    "lyric word '{}' has an invalid time range",
                    w.text
                )));
            }
        }
        Ok(())
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Linear progress through the line, clamped to `[0, 1]`.
    pub fn progress_at(&self, t: f64) -> f64 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return 1.0;
        }
        ((t - self.start) / span).clamp(0.0, 1.0)
    }

    /// Progress of word `idx` at `t`.
    ///
    /// A word whose end time has passed is complete. Otherwise progress trails the line by
    /// `idx * word_delay`, clamped to `[0, 1]`.
    pub fn word_progress(&self, idx: usize, t: f64, word_delay: f64) -> f64 {
        if let Some(w) = self.words.get(idx)
            && t >= w.end
        {
            return 1.0;
        }
        (self.progress_at(t) - idx as f64 * word_delay).clamp(0.0, 1.0)
    }

    /// Space-joined text of the line.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Source of timed lyric lines, in display order.
pub trait LyricProvider {
    fn lines(&self) -> &[LyricLine];
}

/// Vec-backed [`LyricProvider`].
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LyricSheet {
    pub lines: Vec<LyricLine>,
}

impl LyricSheet {
    pub fn new(lines: Vec<LyricLine>) -> Self {
        Self { lines }
    }
}

impl LyricProvider for LyricSheet {
    fn lines(&self) -> &[LyricLine] {
        &self.lines
    }
}

/// Keep lines that are non-empty, well-formed and overlap `[0, horizon)`; order is preserved.
pub fn filter_lines(lines: &[LyricLine], horizon: f64) -> Vec<LyricLine> {
    lines
        .iter()
        .filter(|l| !l.words.is_empty())
        .filter(|l| l.validate().is_ok())
        .filter(|l| l.end > 0.0 && l.start < horizon)
        .cloned()
        .collect()
}

/// Index of the active line at `t`. The first line in order whose range contains `t` wins.
pub fn active_line(lines: &[LyricLine], t: f64) -> Option<usize> {
    lines.iter().position(|l| l.contains(t))
}

#[cfg(test)]
#[path = "../../tests/unit/input/lyrics.rs"]
mod tests;
