/// Aggregated view of study position, useful for the interface layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyProgress {
    /// 1-based position of the current question; 0 when the set is empty.
    pub position: usize,
    pub total: usize,
}

impl StudyProgress {
    /// Share of the set reached so far, in `[0.0, 1.0]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.position as f32 / self.total as f32
        }
    }
}
