// Resource cleanup simulator ("Green Switch"): resources count down to
// expiry and are auto-deleted, reporting every removal through the hub.
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::ResourceCatalog;
use crate::config::CleanupConfig;
use crate::hub::NotificationHub;
use crate::notification::Severity;

pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceStatus {
    Running,
    Stopped,
    Available,
    Pending,
}

impl ResourceStatus {
    const CYCLE: [ResourceStatus; 4] = [
        ResourceStatus::Running,
        ResourceStatus::Stopped,
        ResourceStatus::Available,
        ResourceStatus::Pending,
    ];

    fn cycled(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudResource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub status: ResourceStatus,
    pub expire_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResources {
    pub project: String,
    pub resources: Vec<CloudResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResource {
    pub project: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub deleted_date: DateTime<Utc>,
}

/// Builds `resources_per_project` sample resources for every configured project.
pub fn generate_sample_data<R: Rng>(
    config: &CleanupConfig,
    catalog: &ResourceCatalog,
    rng: &mut R,
) -> Vec<ProjectResources> {
    let max_days = config.max_expire_days.max(1);

    config
        .projects
        .iter()
        .map(|project| {
            let resources = (0..config.resources_per_project)
                .filter_map(|i| {
                    let service = catalog.service_at(i % catalog.service_count().max(1))?;
                    let types = catalog.types_for(service)?;
                    let resource_type = types.get(i % types.len().max(1))?;
                    Some(CloudResource {
                        id: format!("{}-{}", project, i + 1),
                        name: format!("{} {}", resource_type, i + 1),
                        resource_type: resource_type.clone(),
                        status: ResourceStatus::cycled(i),
                        expire_days: rng.random_range(1..=max_days),
                    })
                })
                .collect();

            ProjectResources {
                project: project.clone(),
                resources,
            }
        })
        .collect()
}

#[derive(Default)]
struct SimulatorState {
    projects: Vec<ProjectResources>,
    deleted: Vec<DeletedResource>,
}

pub struct CleanupSimulator {
    hub: NotificationHub,
    state: RwLock<SimulatorState>,
}

impl CleanupSimulator {
    pub fn new(hub: NotificationHub, config: &CleanupConfig, catalog: &ResourceCatalog) -> Self {
        let projects = generate_sample_data(config, catalog, &mut rand::rng());
        info!(
            "Cleanup simulator loaded {} projects ({} resources)",
            projects.len(),
            projects.iter().map(|p| p.resources.len()).sum::<usize>()
        );
        Self::with_projects(hub, projects)
    }

    pub fn with_projects(hub: NotificationHub, projects: Vec<ProjectResources>) -> Self {
        Self {
            hub,
            state: RwLock::new(SimulatorState {
                projects,
                deleted: Vec::new(),
            }),
        }
    }

    pub async fn projects(&self) -> Vec<ProjectResources> {
        self.state.read().await.projects.clone()
    }

    pub async fn deleted_resources(&self) -> Vec<DeletedResource> {
        self.state.read().await.deleted.clone()
    }

    /// Ages every resource by one day and auto-deletes the ones that run out.
    pub async fn tick(&self) -> Vec<(String, CloudResource)> {
        let mut removed = Vec::new();
        {
            let mut state = self.state.write().await;
            for project in state.projects.iter_mut() {
                let mut kept = Vec::with_capacity(project.resources.len());
                for mut resource in project.resources.drain(..) {
                    resource.expire_days -= 1;
                    if resource.expire_days <= 0 {
                        removed.push((project.project.clone(), resource));
                    } else {
                        kept.push(resource);
                    }
                }
                project.resources = kept;
            }
        }

        for (project, resource) in &removed {
            let details = serde_json::json!({
                "deletedHistory": {
                    project.as_str(): [{
                        "name": resource.name,
                        "type": resource.resource_type,
                        "deletedDate": Utc::now(),
                    }]
                }
            });
            self.hub
                .notify_with_details(
                    format!("⚠️ {} was auto-deleted from {}!", resource.name, project),
                    Some(Severity::Warning),
                    Some(details),
                )
                .await;
        }

        debug!("Cleanup tick auto-deleted {} resources", removed.len());
        removed
    }

    /// Manual "Remove Now". Unknown project or id returns `None`.
    pub async fn remove_now(&self, project: &str, resource_id: &str) -> Option<CloudResource> {
        let resource = {
            let mut state = self.state.write().await;
            let entry = state.projects.iter_mut().find(|p| p.project == project)?;
            let index = entry.resources.iter().position(|r| r.id == resource_id)?;
            entry.resources.remove(index)
        };

        self.hub
            .notify(
                format!("🚀 {} removed from {}", resource.name, project),
                Some(Severity::Success),
            )
            .await;

        Some(resource)
    }

    /// Records a permanent deletion and forgets every past notification
    /// that mentions the resource name. Returns the number purged.
    pub async fn forget(
        &self,
        project: impl Into<String>,
        name: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> usize {
        let deleted = DeletedResource {
            project: project.into(),
            name: name.into(),
            resource_type: resource_type.into(),
            deleted_date: Utc::now(),
        };
        let name = deleted.name.clone();

        self.state.write().await.deleted.push(deleted);
        self.hub.purge_history_by_text(&name).await
    }

    /// Runs `tick` every `period` until the task is aborted. A zero period
    /// is raised to [`MIN_TICK_INTERVAL`].
    pub async fn run(&self, period: Duration) {
        let period = if period < MIN_TICK_INTERVAL {
            warn!(
                "Cleanup tick interval {:?} is too short, using {:?}",
                period, MIN_TICK_INTERVAL
            );
            MIN_TICK_INTERVAL
        } else {
            period
        };
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = self.tick().await;
            if !removed.is_empty() {
                info!("Auto-deleted {} expired resources", removed.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn resource(id: &str, name: &str, expire_days: i64) -> CloudResource {
        CloudResource {
            id: id.to_string(),
            name: name.to_string(),
            resource_type: "VM Instances".to_string(),
            status: ResourceStatus::Running,
            expire_days,
        }
    }

    fn simulator(hub: &NotificationHub) -> CleanupSimulator {
        CleanupSimulator::with_projects(
            hub.clone(),
            vec![
                ProjectResources {
                    project: "Project Alpha".to_string(),
                    resources: vec![
                        resource("Project Alpha-1", "VM Instances 1", 1),
                        resource("Project Alpha-2", "VM Instances 2", 3),
                    ],
                },
                ProjectResources {
                    project: "Project Beta".to_string(),
                    resources: vec![resource("Project Beta-1", "Bigtable 1", 2)],
                },
            ],
        )
    }

    #[test]
    fn test_generate_sample_data() {
        let config = CleanupConfig::default();
        let catalog = ResourceCatalog::standard();
        let mut rng = StdRng::seed_from_u64(42);

        let projects = generate_sample_data(&config, &catalog, &mut rng);

        assert_eq!(projects.len(), 4);
        assert_eq!(projects[0].project, "Project Alpha");
        let names: Vec<&str> = projects[0].resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "VM Instances 1",
                "Filestore 2",
                "Spanner 3",
                "VPC Networks 4",
                "IAM Roles 5"
            ]
        );
        assert_eq!(projects[1].resources[0].id, "Project Beta-1");
        assert_eq!(projects[0].resources[1].status, ResourceStatus::Stopped);
        assert_eq!(projects[0].resources[4].status, ResourceStatus::Running);
        assert!(
            projects
                .iter()
                .flat_map(|p| &p.resources)
                .all(|r| (1..=90).contains(&r.expire_days))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_auto_deletes_expired() {
        let hub = NotificationHub::new(&HubConfig::default());
        let sim = simulator(&hub);

        let removed = sim.tick().await;

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, "Project Alpha");
        assert_eq!(removed[0].1.name, "VM Instances 1");

        let projects = sim.projects().await;
        assert_eq!(projects[0].resources.len(), 1);
        assert_eq!(projects[0].resources[0].expire_days, 2);
        assert_eq!(projects[1].resources[0].expire_days, 1);

        let history = hub.list_history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].severity, Severity::Warning);
        assert_eq!(
            history[0].message,
            "⚠️ VM Instances 1 was auto-deleted from Project Alpha!"
        );
        let details = history[0].details.clone().unwrap_or_default();
        assert_eq!(
            details["deletedHistory"]["Project Alpha"][0]["name"],
            "VM Instances 1"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_without_expiry_is_quiet() {
        let hub = NotificationHub::new(&HubConfig::default());
        let sim = CleanupSimulator::with_projects(
            hub.clone(),
            vec![ProjectResources {
                project: "Project Gamma".to_string(),
                resources: vec![resource("Project Gamma-1", "Cloud Run 1", 10)],
            }],
        );

        assert!(sim.tick().await.is_empty());
        assert_eq!(hub.unread_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_now() {
        let hub = NotificationHub::new(&HubConfig::default());
        let sim = simulator(&hub);

        let removed = sim.remove_now("Project Beta", "Project Beta-1").await;

        assert_eq!(removed.map(|r| r.name), Some("Bigtable 1".to_string()));
        assert!(sim.projects().await[1].resources.is_empty());
        let active = hub.list_active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::Success);
        assert_eq!(active[0].message, "🚀 Bigtable 1 removed from Project Beta");

        assert!(sim.remove_now("Project Beta", "Project Beta-1").await.is_none());
        assert!(sim.remove_now("Project Omega", "x").await.is_none());
        assert_eq!(hub.unread_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forget_purges_history() {
        let hub = NotificationHub::new(&HubConfig::default());
        let sim = simulator(&hub);

        sim.remove_now("Project Alpha", "Project Alpha-2").await;
        sim.remove_now("Project Beta", "Project Beta-1").await;
        assert_eq!(hub.unread_count().await, 2);

        let purged = sim
            .forget("Project Alpha", "VM Instances 2", "VM Instances")
            .await;

        assert_eq!(purged, 1);
        let history = hub.list_history().await;
        assert_eq!(history.len(), 1);
        assert!(history[0].message.contains("Bigtable 1"));

        let deleted = sim.deleted_resources().await;
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].name, "VM Instances 2");
        assert_eq!(deleted[0].project, "Project Alpha");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_periodically() {
        let hub = NotificationHub::new(&HubConfig::default());
        let sim = std::sync::Arc::new(simulator(&hub));

        let runner = {
            let sim = std::sync::Arc::clone(&sim);
            tokio::spawn(async move { sim.run(Duration::from_millis(15000)).await })
        };

        tokio::time::sleep(Duration::from_millis(15001)).await;
        tokio::task::yield_now().await;
        assert_eq!(hub.unread_count().await, 1);

        tokio::time::sleep(Duration::from_millis(15000)).await;
        tokio::task::yield_now().await;
        // Beta-1 (2 days) expires on the second tick.
        assert_eq!(hub.unread_count().await, 2);

        runner.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_zero_interval_keeps_ticking() {
        let hub = NotificationHub::new(&HubConfig::default());
        let sim = std::sync::Arc::new(simulator(&hub));
        let config = CleanupConfig {
            tick_interval_ms: 0,
            ..CleanupConfig::default()
        };

        let runner = {
            let sim = std::sync::Arc::clone(&sim);
            let period = config.tick_interval();
            tokio::spawn(async move { sim.run(period).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        assert!(!runner.is_finished());
        // Three ticks are enough to expire every resource in the fixture.
        assert_eq!(hub.unread_count().await, 3);
        assert!(sim.projects().await.iter().all(|p| p.resources.is_empty()));

        runner.abort();
        let joined = runner.await;
        assert!(joined.is_err_and(|e| e.is_cancelled()));
    }
}
