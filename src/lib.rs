//! Scenario Spawner Library
//!
//! Populates a simulated 3-D world with fixed obstacles, autopiloted traffic
//! and pedestrians, keeps it stepping, and removes everything it created on
//! the way out.

pub mod route;
pub mod scenario;
pub mod world;
