#[derive(Debug, Clone)]
pub struct StageMetrics {
    pub index: usize,
    pub name: String,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    pub total_duration_ms: u128,
    pub stages: Vec<StageMetrics>,
}

impl PipelineMetrics {
    pub fn stage_duration_ms(&self, name: &str) -> Option<u128> {
        self.stages
            .iter()
            .find(|stage| stage.name == name)
            .map(|stage| stage.duration_ms)
    }

    pub fn log_stages(&self) {
        for stage in &self.stages {
            tracing::info!(
                stage = %stage.name,
                index = stage.index,
                duration_ms = stage.duration_ms as u64,
                "Stage timing"
            );
        }
        tracing::info!(
            total_duration_ms = self.total_duration_ms as u64,
            "Pipeline timing"
        );
    }
}
