//! Time-stepping regime negotiated with the world at startup

use crate::world::{WorldClient, WorldError, WorldSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// This process advances the world explicitly with `tick()`
    Synchronous,
    /// The world advances on its own clock; we wait for each step
    FreeRunning,
}

impl StepMode {
    pub fn detect(settings: &WorldSettings) -> Self {
        if settings.synchronous_mode {
            StepMode::Synchronous
        } else {
            StepMode::FreeRunning
        }
    }

    /// Move to the next world step so freshly spawned actors become visible
    pub fn step<W: WorldClient>(self, world: &mut W) -> Result<u64, WorldError> {
        match self {
            StepMode::Synchronous => world.tick(),
            StepMode::FreeRunning => world.wait_for_tick(),
        }
    }
}
