//! Tolerances used by welding and analysis.

/// Tolerances for [`analyze_with_params`](crate::analyze_with_params) and
/// [`weld_vertices`](crate::weld_vertices).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    /// Vertices closer than this are merged when welding.
    /// Default: `1e-8`
    pub weld_epsilon: f64,

    /// Allowed protrusion past a neighbouring face plane, relative to the
    /// bounding-box diagonal, before a mesh stops counting as convex.
    /// Default: `1e-8`
    pub convexity_tolerance: f64,

    /// Faces with area below this are reported as degenerate.
    /// Default: `1e-12`
    pub degenerate_area: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-8,
            convexity_tolerance: 1e-8,
            degenerate_area: 1e-12,
        }
    }
}

impl AnalysisParams {
    /// Tolerances suited to tessellated CAD output, whose seams between
    /// B-rep faces are often a few micrometres apart.
    #[must_use]
    pub fn for_cad() -> Self {
        Self {
            weld_epsilon: 1e-5,
            convexity_tolerance: 1e-6,
            ..Self::default()
        }
    }

    /// Set the weld distance.
    #[must_use]
    pub const fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Set the convexity tolerance.
    #[must_use]
    pub const fn with_convexity_tolerance(mut self, tolerance: f64) -> Self {
        self.convexity_tolerance = tolerance;
        self
    }

    /// Set the degenerate-face area threshold.
    #[must_use]
    pub const fn with_degenerate_area(mut self, area: f64) -> Self {
        self.degenerate_area = area;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let p = AnalysisParams::default()
            .with_weld_epsilon(0.5)
            .with_degenerate_area(0.0);
        assert!((p.weld_epsilon - 0.5).abs() < f64::EPSILON);
        assert!(p.degenerate_area.abs() < f64::EPSILON);
        assert!((p.convexity_tolerance - 1e-8).abs() < f64::EPSILON);
    }

    #[test]
    fn cad_preset_is_looser() {
        assert!(AnalysisParams::for_cad().weld_epsilon > AnalysisParams::default().weld_epsilon);
    }
}
