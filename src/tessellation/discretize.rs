use tracing::trace;

use crate::error::{Result, TessellationError};
use crate::kernel::Kernel;
use crate::math::is_positive_finite;

use super::push_polyline;

/// Default deflection for [`DiscretizeEdge`].
pub const DEFAULT_DEFLECTION: f64 = 0.1;

/// Approximates a single edge by a polyline without meshing any face.
pub struct DiscretizeEdge<'a, E> {
    edge: &'a E,
    deflection: f64,
}

impl<'a, E> DiscretizeEdge<'a, E> {
    /// Creates a new `DiscretizeEdge` operation.
    #[must_use]
    pub fn new(edge: &'a E, deflection: f64) -> Self {
        Self { edge, deflection }
    }

    /// Executes the discretization, returning flat segments (six floats each).
    ///
    /// # Errors
    ///
    /// Returns an error if the deflection is not positive, or the kernel's
    /// sampling error unchanged if the sampler did not converge.
    pub fn execute<K>(&self, kernel: &K) -> Result<Vec<f32>>
    where
        K: Kernel<Edge = E>,
    {
        if !is_positive_finite(self.deflection) {
            return Err(TessellationError::InvalidParameters(format!(
                "deflection must be positive, got {}",
                self.deflection
            ))
            .into());
        }
        let points = kernel.discretize(self.edge, self.deflection)?;
        trace!(points = points.len(), deflection = self.deflection, "edge discretized");

        let mut segments = Vec::with_capacity(points.len().saturating_sub(1) * 6);
        push_polyline(&mut segments, &points);
        Ok(segments)
    }
}
