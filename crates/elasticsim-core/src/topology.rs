//! Fleet topology definitions.
//!
//! One origin feeds `num_clusters` clusters. Every cluster is a schedulable
//! pool of `total_servers` servers spread over `floor(sqrt(total_servers))`
//! racks. How the tiers are wired together is not modelled; each entity only
//! carries an identity, its parent and a capacity.

use crate::config::ConfigError;
use elasticsim_scheduler::FleetCapacity;
use serde::{Deserialize, Serialize};

/// A rack of servers behind one top-of-rack switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rack {
    pub id: u32,
    pub cluster_id: u32,
    pub servers: u32,
}

/// A cluster hanging off the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterShape {
    pub id: u32,
    pub racks: Vec<Rack>,
    /// Rated rate of a single server (requests or bytes per step).
    pub server_capacity: f64,
}

impl ClusterShape {
    /// Number of servers in the cluster.
    pub fn server_count(&self) -> u32 {
        self.racks.iter().map(|r| r.servers).sum()
    }
}

/// Number of racks for a pool of `servers`.
pub fn racks_for(servers: u32) -> u32 {
    ((servers as f64).sqrt().floor() as u32).max(1)
}

/// Split `servers` over `racks` as evenly as possible.
fn distribute(servers: u32, racks: u32) -> Vec<u32> {
    let base = servers / racks;
    let extra = servers % racks;
    (0..racks)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

/// Static fleet shape. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    capacity: FleetCapacity,
    num_clusters: u32,
    server_rate: f64,
    clusters: Vec<ClusterShape>,
}

impl Topology {
    pub fn new(
        total_servers: u32,
        num_clusters: u32,
        utilization_threshold: f64,
        server_rate: f64,
    ) -> Result<Self, ConfigError> {
        if num_clusters == 0 {
            return Err(ConfigError::Validation(
                "num_clusters must be > 0".to_string(),
            ));
        }
        if !server_rate.is_finite() || server_rate <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "server_rate must be > 0, got {}",
                server_rate
            )));
        }
        let capacity = FleetCapacity::new(total_servers, utilization_threshold)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let num_racks = racks_for(total_servers);
        let rack_sizes = distribute(total_servers, num_racks);
        let mut rack_id = 0;
        let clusters = (0..num_clusters)
            .map(|cluster_id| {
                let racks = rack_sizes
                    .iter()
                    .map(|&servers| {
                        let rack = Rack {
                            id: rack_id,
                            cluster_id,
                            servers,
                        };
                        rack_id += 1;
                        rack
                    })
                    .collect();
                ClusterShape {
                    id: cluster_id,
                    racks,
                    server_capacity: server_rate,
                }
            })
            .collect();

        Ok(Self {
            capacity,
            num_clusters,
            server_rate,
            clusters,
        })
    }

    /// Capacity parameters handed to the scheduler.
    pub fn capacity(&self) -> FleetCapacity {
        self.capacity
    }

    pub fn total_servers(&self) -> u32 {
        self.capacity.total_servers()
    }

    pub fn utilization_threshold(&self) -> f64 {
        self.capacity.utilization_threshold()
    }

    pub fn num_clusters(&self) -> u32 {
        self.num_clusters
    }

    pub fn server_rate(&self) -> f64 {
        self.server_rate
    }

    pub fn clusters(&self) -> &[ClusterShape] {
        &self.clusters
    }

    pub fn cluster(&self, id: u32) -> Option<&ClusterShape> {
        self.clusters.get(id as usize)
    }

    /// Servers across every cluster.
    pub fn fleet_servers(&self) -> u64 {
        self.clusters.iter().map(|c| c.server_count() as u64).sum()
    }

    /// Aggregate rated capacity used to normalize raw load:
    /// `threshold * server_rate * total_servers`.
    pub fn rated_capacity(&self) -> f64 {
        self.utilization_threshold() * self.server_rate * self.total_servers() as f64
    }
}
