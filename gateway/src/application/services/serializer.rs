//! Application service: compact serialization with token accounting.
//!
//! Every response is either the compact encoding plus a savings report, or
//! an explicit error block that carries the JSON baseline for diagnosis. The
//! JSON baseline is never returned in place of the compact payload.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::{CompactEncoder, TokenCounter};

/// First line of every rendered response.
pub const TOON_MARKER: &str = "@@TOON@@";

/// Token counts of the JSON baseline and the compact encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenReport {
    /// Tokens in the JSON baseline, `-1` when unavailable.
    pub json_tokens: i64,
    /// Tokens in the compact encoding, `-1` when unavailable.
    pub compact_tokens: i64,
    /// `100 * (1 - compact / json)`, only when both counts are positive.
    pub savings_percent: Option<f64>,
}

impl TokenReport {
    pub const UNAVAILABLE: i64 = -1;

    /// Build a report from raw counts; `None` marks a count as unavailable.
    #[must_use]
    pub fn measure(json: Option<usize>, compact: Option<usize>) -> Self {
        let json_tokens = json.map_or(Self::UNAVAILABLE, to_count);
        let compact_tokens = compact.map_or(Self::UNAVAILABLE, to_count);

        #[allow(clippy::cast_precision_loss)]
        let savings_percent = (json_tokens > 0 && compact_tokens > 0)
            .then(|| 100.0 * (1.0 - compact_tokens as f64 / json_tokens as f64));

        Self {
            json_tokens,
            compact_tokens,
            savings_percent,
        }
    }
}

fn to_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl fmt::Display for TokenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[TOON SAVINGS] JSON tokens: {} | TOON tokens: {} | Savings: ",
            self.json_tokens, self.compact_tokens
        )?;
        match self.savings_percent {
            Some(p) => write!(f, "{p:.1}%"),
            None => f.write_str("unavailable"),
        }
    }
}

/// Outcome of serializing one response.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Compact { text: String, report: TokenReport },
    Failed { reason: String, json_baseline: String },
}

impl Rendered {
    #[must_use]
    pub fn is_compact(&self) -> bool {
        matches!(self, Self::Compact { .. })
    }

    #[must_use]
    pub fn report(&self) -> Option<&TokenReport> {
        match self {
            Self::Compact { report, .. } => Some(report),
            Self::Failed { .. } => None,
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact { text, report } => {
                write!(f, "{TOON_MARKER}\n```toon\n{text}\n```\n{report}")
            }
            Self::Failed {
                reason,
                json_baseline,
            } => write!(
                f,
                "{TOON_MARKER}\n[TOON ERROR] {reason}\n```json\n{json_baseline}\n```"
            ),
        }
    }
}

/// Compact encoder plus reference tokenizer, both injected at construction.
#[derive(Clone)]
pub struct CompactSerializer {
    encoder: Arc<dyn CompactEncoder>,
    counter: Arc<dyn TokenCounter>,
}

impl fmt::Debug for CompactSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactSerializer").finish_non_exhaustive()
    }
}

impl CompactSerializer {
    #[must_use]
    pub fn new(encoder: Arc<dyn CompactEncoder>, counter: Arc<dyn TokenCounter>) -> Self {
        Self { encoder, counter }
    }

    /// Serialize `value`, falling back to an explicit error block.
    #[must_use]
    pub fn serialize(&self, value: &Value) -> Rendered {
        let json_baseline =
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());

        let text = match self.encoder.encode(value) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "TOON conversion failed");
                return Rendered::Failed {
                    reason: err.to_string(),
                    json_baseline,
                };
            }
        };

        let report = TokenReport::measure(
            self.counter.count(&json_baseline),
            self.counter.count(&text),
        );
        match report.savings_percent {
            Some(savings) => tracing::info!(
                json_tokens = report.json_tokens,
                toon_tokens = report.compact_tokens,
                savings = %format!("{savings:.1}%"),
                "[TOON SAVINGS]"
            ),
            None => tracing::debug!("token savings unavailable"),
        }
        tracing::debug!(toon = %text, "[TOON OUTPUT]");

        Rendered::Compact { text, report }
    }
}
