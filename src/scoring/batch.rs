use crate::core::row_schema::RowValue;
use crate::utils::env;
use tracing::debug;

/// Fallback batch size when neither the configuration nor the model states
/// a usable one.
pub const DEFAULT_BATCH_SIZE: usize = 100;

enum State {
    /// Rows flow through one at a time.
    Idle,
    /// Rows buffer until the capacity is reached or the stream ends.
    Accumulating {
        capacity: usize,
        rows: Vec<Vec<RowValue>>,
    },
}

/// Buffers rows for models that score more efficiently in batches.
///
/// Armed only when the model is batch-capable and model selection does not
/// vary per row; otherwise it stays idle and the caller scores row by row.
pub struct BatchAccumulator {
    state: State,
}

impl BatchAccumulator {
    pub fn idle() -> BatchAccumulator {
        BatchAccumulator { state: State::Idle }
    }

    pub fn accumulating(capacity: usize) -> BatchAccumulator {
        BatchAccumulator {
            state: State::Accumulating {
                capacity: capacity.max(1),
                rows: Vec::new(),
            },
        }
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, State::Accumulating { .. })
    }

    pub fn len(&self) -> usize {
        match &self.state {
            State::Idle => 0,
            State::Accumulating { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffers a row; returns the full buffer once the capacity is reached.
    pub fn push(&mut self, row: Vec<RowValue>) -> Option<Vec<Vec<RowValue>>> {
        match &mut self.state {
            State::Idle => {
                debug_assert!(false, "push on an idle accumulator");
                None
            }
            State::Accumulating { capacity, rows } => {
                rows.push(row);
                if rows.len() >= *capacity {
                    Some(std::mem::take(rows))
                } else {
                    None
                }
            }
        }
    }

    /// Takes whatever is buffered; used for the forced flush at
    /// end-of-stream.
    pub fn drain(&mut self) -> Vec<Vec<RowValue>> {
        match &mut self.state {
            State::Idle => Vec::new(),
            State::Accumulating { rows, .. } => std::mem::take(rows),
        }
    }
}

/// Resolves the batch size to use: the configured value (after environment
/// substitution), else the model's preferred size, else the default.
pub fn resolve_batch_size(configured: Option<&str>, model_preferred: Option<usize>) -> usize {
    if let Some(raw) = configured {
        let substituted = env::substitute(raw);
        match substituted.trim().parse::<usize>() {
            Ok(size) if size > 0 => return size,
            _ => debug!(
                value = %substituted,
                "unable to parse configured batch size, trying the model's preferred size"
            ),
        }
    }

    match model_preferred {
        Some(size) if size > 0 => size,
        _ => {
            debug!(default = DEFAULT_BATCH_SIZE, "using default batch size");
            DEFAULT_BATCH_SIZE
        }
    }
}
