//! Per-step demand formula shared by every policy.
//!
//! Demand is expressed in servers: the number of servers needed to carry a
//! normalized load without exceeding the utilization threshold.

use crate::types::FleetCapacity;

/// Unrounded server demand: `(load / threshold) * total_servers`.
pub fn server_demand(load: f64, capacity: &FleetCapacity) -> f64 {
    (load / capacity.utilization_threshold()) * capacity.total_servers() as f64
}

/// Demand rounded down, as used by the offline policies (`m_t`).
///
/// Saturates at `u32::MAX` for absurdly large loads.
pub fn floor_demand(load: f64, capacity: &FleetCapacity) -> u32 {
    server_demand(load, capacity).floor() as u32
}

/// Demand rounded up, as used by the online controller (`lambda_t`).
pub fn ceil_demand(load: f64, capacity: &FleetCapacity) -> u32 {
    server_demand(load, capacity).ceil() as u32
}
