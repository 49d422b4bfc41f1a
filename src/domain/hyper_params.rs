// ============================================================
// Layer 3 — Hyperparameter Set
// ============================================================
// One immutable bundle of training and model settings.
//
// Construction happens exactly once at startup:
//
//   HyperParams::default()          ← defaults, defined here only
//       │
//       ▼
//   from_overrides(key/value pairs) ← config file, then argv
//       │
//       ▼
//   &HyperParams                    ← shared read-only by every layer
//
// Each recognised key is looked up in the OPTIONS table, parsed
// to its declared kind and range-checked. A bad value produces a
// TrainError::ConfigParse which is logged and the previous value
// is kept. Unknown keys are ignored.
//
// The numeric fields can also be flattened into the
// `hyper.params` artifact written next to the checkpoints.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::TrainError;

/// The value type an option is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Int,
    Float,
    Str,
}

impl OptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::Int   => "int",
            OptionKind::Float => "float",
            OptionKind::Str   => "string",
        }
    }
}

/// One recognised configuration option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub help: &'static str,
}

/// Every option that can be overridden from outside.
pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec { name: "hidden_size",          kind: OptionKind::Int,   help: "number of hidden units in hidden layers" },
    OptionSpec { name: "num_layers",           kind: OptionKind::Int,   help: "number of hidden layers" },
    OptionSpec { name: "batch_size",           kind: OptionKind::Int,   help: "size of batches in training" },
    OptionSpec { name: "max_epoch",            kind: OptionKind::Int,   help: "max number of epochs to train for" },
    OptionSpec { name: "learning_rate",        kind: OptionKind::Float, help: "beginning learning rate" },
    OptionSpec { name: "steps_per_checkpoint", kind: OptionKind::Int,   help: "number of steps before running the test set" },
    OptionSpec { name: "lr_decay_factor",      kind: OptionKind::Float, help: "factor by which to decay the learning rate, in (0, 1]" },
    OptionSpec { name: "max_seq_length",       kind: OptionKind::Int,   help: "maximum length of an input token sequence" },
    OptionSpec { name: "checkpoint_dir",       kind: OptionKind::Str,   help: "directory to store/restore checkpoints" },
    OptionSpec { name: "dropout",              kind: OptionKind::Float, help: "keep probability of hidden outputs, in (0, 1]" },
    OptionSpec { name: "grad_clip",            kind: OptionKind::Float, help: "max gradient norm" },
];

/// Field order of the `hyper.params` artifact.
pub const ARTIFACT_FIELDS: [&str; 11] = [
    "vocab_size",
    "hidden_size",
    "dropout",
    "num_layers",
    "grad_clip",
    "max_seq_length",
    "batch_size",
    "learning_rate",
    "lr_decay_factor",
    "max_epoch",
    "steps_per_checkpoint",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    pub hidden_size:          usize,
    pub num_layers:           usize,
    pub batch_size:           usize,
    pub max_epoch:            usize,
    pub learning_rate:        f64,
    pub steps_per_checkpoint: usize,
    pub lr_decay_factor:      f64,
    pub max_seq_length:       usize,
    pub checkpoint_dir:       PathBuf,
    /// Keep probability, not drop probability.
    pub dropout:              f64,
    pub grad_clip:            f64,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self {
            hidden_size:          128,
            num_layers:           1,
            batch_size:           25,
            max_epoch:            150,
            learning_rate:        0.001,
            steps_per_checkpoint: 10,
            lr_decay_factor:      0.01,
            max_seq_length:       500,
            checkpoint_dir:       PathBuf::from("data/checkpoints/"),
            dropout:              1.0,
            grad_clip:            5.0,
        }
    }
}

impl HyperParams {
    /// Start from the defaults and apply every override in order.
    /// Bad values are logged and skipped, never fatal.
    pub fn from_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in overrides {
            let (key, value) = (key.as_ref(), value.as_ref());
            match params.apply(key, value) {
                Ok(true)  => tracing::debug!("option {key} = {value}"),
                Ok(false) => tracing::debug!("ignoring unknown option '{key}'"),
                Err(e)    => tracing::warn!("{e}; keeping {key} = {}", params.value_of(key)),
            }
        }
        params
    }

    /// Apply one override. Returns `Ok(false)` for keys not in [`OPTIONS`].
    pub fn apply(&mut self, key: &str, value: &str) -> Result<bool, TrainError> {
        let Some(spec) = OPTIONS.iter().find(|o| o.name == key) else {
            return Ok(false);
        };
        let raw = value.trim();

        match spec.kind {
            OptionKind::Int => {
                let n = parse_count(key, raw)?;
                match key {
                    "hidden_size"          => self.hidden_size = n,
                    "num_layers"           => self.num_layers = n,
                    "batch_size"           => self.batch_size = n,
                    "max_epoch"            => self.max_epoch = n,
                    "steps_per_checkpoint" => self.steps_per_checkpoint = n,
                    "max_seq_length"       => self.max_seq_length = n,
                    _ => unreachable!("int option without a field: {key}"),
                }
            }
            OptionKind::Float => {
                let x = parse_float(key, raw)?;
                match key {
                    "learning_rate"   => self.learning_rate = positive(key, raw, x)?,
                    "grad_clip"       => self.grad_clip = positive(key, raw, x)?,
                    "lr_decay_factor" => self.lr_decay_factor = unit_interval(key, raw, x)?,
                    "dropout"         => self.dropout = unit_interval(key, raw, x)?,
                    _ => unreachable!("float option without a field: {key}"),
                }
            }
            OptionKind::Str => {
                if raw.is_empty() {
                    return Err(parse_error(key, value, "a non-empty string"));
                }
                self.checkpoint_dir = PathBuf::from(raw);
            }
        }
        Ok(true)
    }

    /// Current value of a named option, rendered for display.
    pub fn value_of(&self, key: &str) -> String {
        match key {
            "hidden_size"          => self.hidden_size.to_string(),
            "num_layers"           => self.num_layers.to_string(),
            "batch_size"           => self.batch_size.to_string(),
            "max_epoch"            => self.max_epoch.to_string(),
            "learning_rate"        => self.learning_rate.to_string(),
            "steps_per_checkpoint" => self.steps_per_checkpoint.to_string(),
            "lr_decay_factor"      => self.lr_decay_factor.to_string(),
            "max_seq_length"       => self.max_seq_length.to_string(),
            "checkpoint_dir"       => self.checkpoint_dir.display().to_string(),
            "dropout"              => self.dropout.to_string(),
            "grad_clip"            => self.grad_clip.to_string(),
            _ => String::new(),
        }
    }

    // ─── hyper.params artifact ────────────────────────────────────────────────

    /// Flatten the numeric fields (plus the vocabulary size) in
    /// [`ARTIFACT_FIELDS`] order.
    pub fn to_artifact(&self, vocab_size: usize) -> [f64; 11] {
        [
            vocab_size as f64,
            self.hidden_size as f64,
            self.dropout,
            self.num_layers as f64,
            self.grad_clip,
            self.max_seq_length as f64,
            self.batch_size as f64,
            self.learning_rate,
            self.lr_decay_factor,
            self.max_epoch as f64,
            self.steps_per_checkpoint as f64,
        ]
    }

    /// Rebuild a set from an artifact, keeping this set's checkpoint_dir.
    /// Returns the params and the stored vocabulary size, or `None` if the
    /// array is the wrong length or holds out-of-range values.
    pub fn from_artifact(&self, values: &[f64]) -> Option<(Self, usize)> {
        if values.len() != ARTIFACT_FIELDS.len() {
            return None;
        }
        let count = |x: f64| (x >= 1.0 && x.fract() == 0.0).then_some(x as usize);
        let fraction = |x: f64| (x > 0.0 && x <= 1.0).then_some(x);
        let positive = |x: f64| (x.is_finite() && x > 0.0).then_some(x);

        let params = Self {
            hidden_size:          count(values[1])?,
            dropout:              fraction(values[2])?,
            num_layers:           count(values[3])?,
            grad_clip:            positive(values[4])?,
            max_seq_length:       count(values[5])?,
            batch_size:           count(values[6])?,
            learning_rate:        positive(values[7])?,
            lr_decay_factor:      fraction(values[8])?,
            max_epoch:            count(values[9])?,
            steps_per_checkpoint: count(values[10])?,
            checkpoint_dir:       self.checkpoint_dir.clone(),
        };
        Some((params, count(values[0])?))
    }

    /// Names of the artifact fields whose values differ between two sets.
    pub fn differences(&self, other: &Self, vocab_size: usize, other_vocab: usize) -> Vec<&'static str> {
        let a = self.to_artifact(vocab_size);
        let b = other.to_artifact(other_vocab);
        ARTIFACT_FIELDS
            .iter()
            .zip(a.iter().zip(b.iter()))
            .filter(|(_, (x, y))| x != y)
            .map(|(name, _)| *name)
            .collect()
    }
}

// ─── Override sources ─────────────────────────────────────────────────────────

/// Collect key/value pairs from trailing process arguments.
///
/// Accepts `key value`, `key=value`, and either form with a leading `--`.
/// A key with no value at the end of the list is dropped with a warning.
pub fn overrides_from_args(args: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut iter  = args.iter();

    while let Some(token) = iter.next() {
        let token = token.trim_start_matches("--");
        if let Some((key, value)) = token.split_once('=') {
            pairs.push((key.to_string(), value.to_string()));
            continue;
        }
        match iter.next() {
            Some(value) => pairs.push((token.to_string(), value.clone())),
            None => tracing::warn!("option '{token}' has no value; ignoring it"),
        }
    }
    pairs
}

/// Collect key/value pairs from a JSON object such as
/// `{"batch_size": 50, "checkpoint_dir": "runs/a"}`.
pub fn overrides_from_json(text: &str) -> Result<Vec<(String, String)>, TrainError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| TrainError::ConfigParse {
        key:      "<config file>".into(),
        value:    e.to_string(),
        expected: "a JSON object",
    })?;

    let serde_json::Value::Object(map) = value else {
        return Err(TrainError::ConfigParse {
            key:      "<config file>".into(),
            value:    value.to_string(),
            expected: "a JSON object",
        });
    };

    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, v)
        })
        .collect())
}

fn parse_error(key: &str, value: &str, expected: &'static str) -> TrainError {
    TrainError::ConfigParse { key: key.to_string(), value: value.to_string(), expected }
}

fn parse_count(key: &str, raw: &str) -> Result<usize, TrainError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(parse_error(key, raw, "a positive integer")),
    }
}

fn parse_float(key: &str, raw: &str) -> Result<f64, TrainError> {
    match raw.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(parse_error(key, raw, "a finite number")),
    }
}

fn positive(key: &str, raw: &str, x: f64) -> Result<f64, TrainError> {
    if x > 0.0 { Ok(x) } else { Err(parse_error(key, raw, "a number greater than 0")) }
}

fn unit_interval(key: &str, raw: &str, x: f64) -> Result<f64, TrainError> {
    if x > 0.0 && x <= 1.0 { Ok(x) } else { Err(parse_error(key, raw, "a number in (0, 1]")) }
}
