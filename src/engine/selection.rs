/// Which configured dimension the chart is currently showing.
///
/// Selecting an identifier outside the configured set is a silent no-op.
#[derive(Debug, Clone)]
pub struct DimensionSelection {
    dimensions: Vec<String>,
    active: usize,
}

impl DimensionSelection {
    /// `initial` falls back to the first configured dimension when it is not
    /// in the set. Returns `None` for an empty set.
    pub fn new(dimensions: Vec<String>, initial: &str) -> Option<Self> {
        if dimensions.is_empty() {
            return None;
        }
        let active = dimensions.iter().position(|d| d == initial).unwrap_or(0);
        Some(Self { dimensions, active })
    }

    /// Switch to `dimension` if it is configured. Returns whether it was accepted.
    pub fn select(&mut self, dimension: &str) -> bool {
        match self.dimensions.iter().position(|d| d == dimension) {
            Some(idx) => {
                self.active = idx;
                true
            }
            None => {
                tracing::debug!(dimension = %dimension, "ignoring selection of unconfigured dimension");
                false
            }
        }
    }

    pub fn current(&self) -> &str {
        &self.dimensions[self.active]
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn is_configured(&self, dimension: &str) -> bool {
        self.dimensions.iter().any(|d| d == dimension)
    }
}
