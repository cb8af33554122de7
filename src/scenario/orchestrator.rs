//! Scenario population orchestrator
//!
//! Runs the phases in order: fixed obstacles, random traffic, safety
//! policy, pedestrians, then the step loop. Teardown runs exactly once,
//! whether the run finishes, is cancelled, errors out or unwinds.

use anyhow::{Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::cancel::CancelToken;
use super::config::{ScenarioConfig, WalkerStrategy};
use super::fixed::{spawn_fixed_group, AnchorReservations, FixedPlacementReport};
use super::policy::{apply_policy_to_registry, configure_traffic_manager, PolicyReport};
use super::random_fill::{spawn_random_vehicles, RandomFillReport};
use super::registry::EntityRegistry;
use super::step::StepMode;
use super::teardown::{teardown, TeardownReport};
use super::types::EntityKind;
use super::walkers::{spawn_walkers_batched, spawn_walkers_retrying, start_walkers, PairingReport};
use crate::world::WorldClient;

/// Everything the population phases did
#[derive(Debug, Clone, Default)]
pub struct PopulationReport {
    pub fixed: Vec<FixedPlacementReport>,
    pub random: Option<RandomFillReport>,
    pub policy: Option<PolicyReport>,
    pub walkers: Option<PairingReport>,
    pub walkers_started: usize,
    /// Cancellation cut population short
    pub interrupted: bool,
}

/// Final account of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub population: PopulationReport,
    pub vehicles: usize,
    pub walkers: usize,
    pub ticks: u64,
    pub cancelled: bool,
    pub teardown: TeardownReport,
}

pub struct Orchestrator<'w, W: WorldClient> {
    world: &'w mut W,
    config: ScenarioConfig,
    registry: EntityRegistry,
    reservations: AnchorReservations,
    step_mode: StepMode,
    synchronous_master: bool,
    cancel: CancelToken,
    rng: StdRng,
    torn_down: bool,
}

impl<'w, W: WorldClient> Orchestrator<'w, W> {
    fn new_internal(world: &'w mut W, config: ScenarioConfig, cancel: CancelToken, rng: StdRng) -> Self {
        let step_mode = StepMode::detect(&world.settings());
        Self {
            world,
            config,
            registry: EntityRegistry::new(),
            reservations: AnchorReservations::new(),
            step_mode,
            synchronous_master: step_mode == StepMode::Synchronous,
            cancel,
            rng,
            torn_down: false,
        }
    }

    /// Orchestrator with a fresh random seed; every run differs
    pub fn new(world: &'w mut W, config: ScenarioConfig, cancel: CancelToken) -> Self {
        Self::new_internal(world, config, cancel, StdRng::from_rng(&mut rand::rng()))
    }

    /// Orchestrator with a fixed seed for reproducible runs
    pub fn new_with_seed(
        world: &'w mut W,
        config: ScenarioConfig,
        cancel: CancelToken,
        seed: u64,
    ) -> Self {
        Self::new_internal(world, config, cancel, StdRng::seed_from_u64(seed))
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn reservations(&self) -> &AnchorReservations {
        &self.reservations
    }

    pub fn step_mode(&self) -> StepMode {
        self.step_mode
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn interrupted(&self, report: &mut PopulationReport) -> bool {
        if self.cancel.is_cancelled() {
            if !report.interrupted {
                info!("Cancelled by user. No further entities will be created.");
            }
            report.interrupted = true;
        }
        report.interrupted
    }

    /// Place fixed obstacles, fill random traffic and create pedestrians
    pub fn populate(&mut self) -> Result<PopulationReport> {
        let mut report = PopulationReport::default();
        if self.interrupted(&mut report) {
            return Ok(report);
        }

        let anchors = self.world.spawn_points();
        let library = self.world.blueprint_library();
        let tm_port = self.config.traffic_manager_port;

        if self.config.fixed.is_empty() {
            info!("--- No Fixed Obstacles (Skipped) ---");
        } else {
            info!("--- Spawning Fixed Obstacles ---");
        }
        for group in &self.config.fixed {
            if self.interrupted(&mut report) {
                return Ok(report);
            }
            report.fixed.push(spawn_fixed_group(
                &mut *self.world,
                &anchors,
                &library,
                group,
                tm_port,
                &mut self.reservations,
                &mut self.registry,
                &mut self.rng,
            ));
        }
        self.reservations.freeze();

        let fixed_count = self.registry.count_of(EntityKind::FixedObstacle)
            + self.registry.count_of(EntityKind::FixedVehicle);
        info!("Spawned total {} fixed obstacles", fixed_count);

        let wants_traffic = self.config.random_vehicles > 0 || self.config.walkers > 0;
        if wants_traffic {
            configure_traffic_manager(
                self.world.traffic_manager(tm_port),
                &self.config.policy,
                self.synchronous_master,
            );
        }

        if self.config.random_vehicles > 0 {
            if self.interrupted(&mut report) {
                return Ok(report);
            }
            report.random = Some(spawn_random_vehicles(
                &mut *self.world,
                &anchors,
                &library,
                self.config.random_vehicles,
                tm_port,
                self.synchronous_master,
                &self.reservations,
                &self.config.keep_clear,
                &mut self.registry,
                &mut self.rng,
            ));
            report.policy = Some(apply_policy_to_registry(
                &mut *self.world,
                &self.registry,
                &self.config.policy,
                tm_port,
            ));
        }

        if self.config.walkers > 0 {
            if self.interrupted(&mut report) {
                return Ok(report);
            }
            info!("--- Spawning {} Walkers ---", self.config.walkers);
            let pairing = match self.config.walker_strategy {
                WalkerStrategy::Batched => spawn_walkers_batched(
                    &mut *self.world,
                    &library,
                    self.config.walkers,
                    self.config.fallback_walker_speed,
                    &mut self.registry,
                    &mut self.rng,
                ),
                WalkerStrategy::Retrying => spawn_walkers_retrying(
                    &mut *self.world,
                    &library,
                    self.config.walkers,
                    self.config.fallback_walker_speed,
                    &mut self.registry,
                    &mut self.rng,
                    &self.cancel,
                ),
            }
            .context("Failed to spawn walkers")?;
            report.walkers = Some(pairing);

            report.walkers_started =
                start_walkers(&mut *self.world, self.registry.pairs(), self.step_mode)?;
        }

        info!(
            "Done. (Vehicles: {}, Walkers: {})",
            self.registry.vehicles().len(),
            self.registry.pairs().len()
        );
        Ok(report)
    }

    /// Keep the world stepping until cancelled or the tick limit is reached
    pub fn run_loop(&mut self) -> Result<u64> {
        info!("Press Ctrl+C to exit and destroy actors.");

        let mut ticks = 0;
        while !self.cancel.is_cancelled() {
            if self.config.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            self.step_mode
                .step(&mut *self.world)
                .context("Simulation step failed")?;
            ticks += 1;
        }

        if self.cancel.is_cancelled() {
            info!("Cancelled by user. Destroying actors...");
        }
        Ok(ticks)
    }

    /// Tear everything down; only the first call does any work
    pub fn shutdown(&mut self) -> TeardownReport {
        if self.torn_down {
            return TeardownReport::default();
        }
        self.torn_down = true;
        teardown(
            &mut *self.world,
            &mut self.registry,
            self.synchronous_master,
            self.config.settle_delay,
        )
    }

    /// Populate, step until cancelled, then tear down unconditionally
    pub fn run(mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let outcome = self.populate().and_then(|population| {
            summary.population = population;
            summary.vehicles = self.registry.vehicles().len();
            summary.walkers = self.registry.pairs().len();
            if summary.population.interrupted {
                return Ok(0);
            }
            self.run_loop()
        });

        summary.cancelled = self.cancel.is_cancelled();
        summary.teardown = self.shutdown();

        summary.ticks = outcome?;
        Ok(summary)
    }
}

impl<W: WorldClient> Drop for Orchestrator<'_, W> {
    fn drop(&mut self) {
        if !self.torn_down {
            warn!("Orchestrator dropped before teardown, cleaning up now");
            self.shutdown();
        }
    }
}
