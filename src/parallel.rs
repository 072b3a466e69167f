use rayon::prelude::*;

/// Number of workers used for per-row and per-column fan-outs.
///
/// Passed explicitly to [`Table::apply`](crate::Table::apply),
/// [`cooks_distance`](crate::diagnostics::cooks_distance) and
/// [`dffits`](crate::diagnostics::dffits). A single worker runs inline on the
/// calling thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parallelism {
    workers: usize,
}

impl Parallelism {
    pub const DEFAULT_WORKERS: usize = 4;

    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn sequential() -> Self {
        Self { workers: 1 }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Evaluates `f(0..len)` and returns the results in index order.
    ///
    /// The range is cut into at most `workers` contiguous chunks that run on
    /// rayon's global pool, each chunk sequentially. Every index lands in its
    /// own output slot, so `f` only needs shared read access to its captures.
    pub(crate) fn map_indexed<F>(&self, len: usize, f: F) -> Vec<f64>
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        let chunks = self.workers.min(len);
        if chunks <= 1 {
            return (0..len).map(f).collect();
        }

        let chunk_size = len.div_ceil(chunks);
        let parts: Vec<Vec<f64>> = (0..len)
            .into_par_iter()
            .step_by(chunk_size)
            .map(|start| (start..(start + chunk_size).min(len)).map(&f).collect())
            .collect();
        parts.concat()
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORKERS)
    }
}
