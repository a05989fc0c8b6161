//! Health counters shared by every grouping

use crate::models::Pod;
use serde::{Deserialize, Serialize};

/// Pod and container counters for a set of pods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRollup {
    pub total_pods: usize,
    /// Pods in the Running phase
    pub healthy_pods: usize,
    pub total_containers: usize,
    /// Containers with the ready flag set
    pub healthy_containers: usize,
}

impl HealthRollup {
    pub fn from_pods<'a>(pods: impl IntoIterator<Item = &'a Pod>) -> Self {
        let mut rollup = Self::default();
        for pod in pods {
            rollup.add(pod);
        }
        rollup
    }

    fn add(&mut self, pod: &Pod) {
        let readiness = pod.readiness();
        self.total_pods += 1;
        if pod.phase.is_running() {
            self.healthy_pods += 1;
        }
        self.total_containers += readiness.total;
        self.healthy_containers += readiness.ready;
    }

    pub fn unhealthy_pods(&self) -> usize {
        self.total_pods - self.healthy_pods
    }

    /// Healthy iff there is at least one container and every container is ready.
    /// A group without containers is reported unhealthy: it signals missing data.
    pub fn is_healthy(&self) -> bool {
        self.total_containers > 0 && self.healthy_containers == self.total_containers
    }
}

/// Global rollup over every pod
pub fn summarize(pods: &[Pod]) -> HealthRollup {
    HealthRollup::from_pods(pods)
}
