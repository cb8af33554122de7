//! Template selection shared by every spawning phase

use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::world::{Blueprint, BlueprintLibrary};

/// Templates matching `pattern`, narrowed to four-wheeled vehicles if asked
pub fn candidate_templates(
    library: &BlueprintLibrary,
    pattern: &str,
    four_wheels_only: bool,
) -> Vec<Blueprint> {
    let mut blueprints = library.filter(pattern);
    if four_wheels_only {
        blueprints.retain(|bp| bp.number_of_wheels() == Some(4));
    }
    blueprints
}

/// Pick one template at random and give it a random recommended color
pub fn pick_template(candidates: &[Blueprint], rng: &mut impl Rng) -> Option<Blueprint> {
    let mut blueprint = candidates.choose(rng)?.clone();
    randomize_color(&mut blueprint, rng);
    Some(blueprint)
}

pub fn randomize_color(blueprint: &mut Blueprint, rng: &mut impl Rng) {
    let Some(color) = blueprint
        .attribute("color")
        .and_then(|attribute| attribute.recommended_values.choose(rng))
        .cloned()
    else {
        return;
    };

    if let Err(e) = blueprint.set_attribute("color", color) {
        debug!("Keeping default color on {}: {}", blueprint.id, e);
    }
}
