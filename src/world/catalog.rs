//! Stock blueprint library of the simulated world

use super::blueprint::{ActorAttribute, Blueprint, BlueprintLibrary};

pub const WALKER_CONTROLLER_ID: &str = "controller.ai.walker";

const VEHICLE_COLORS: &[&str] = &["255,255,255", "17,37,103", "120,0,0", "40,40,40", "201,201,201"];

/// Recommended pedestrian speeds: stopped, walking, running
const WALKER_SPEEDS: &[&str] = &["0.0", "1.4", "2.5"];

fn vehicle(id: &str, wheels: u32, colored: bool) -> Blueprint {
    let blueprint = Blueprint::new(id)
        .with_attribute("number_of_wheels", ActorAttribute::fixed(wheels.to_string()))
        .with_attribute("role_name", ActorAttribute::free("default"));

    if colored {
        blueprint.with_attribute("color", ActorAttribute::choice(VEHICLE_COLORS))
    } else {
        blueprint
    }
}

fn prop(id: &str) -> Blueprint {
    Blueprint::new(id).with_attribute("role_name", ActorAttribute::free("default"))
}

fn pedestrian(id: &str, invincible_flag: bool) -> Blueprint {
    let blueprint = Blueprint::new(id)
        .with_attribute("role_name", ActorAttribute::free("default"))
        .with_attribute("speed", ActorAttribute::choice(WALKER_SPEEDS));

    if invincible_flag {
        blueprint.with_attribute("is_invincible", ActorAttribute::choice(&["true", "false"]))
    } else {
        blueprint
    }
}

/// Library shipped with the simulated world
pub fn stock_library() -> BlueprintLibrary {
    let mut blueprints = vec![
        vehicle("vehicle.audi.tt", 4, true),
        vehicle("vehicle.tesla.model3", 4, true),
        vehicle("vehicle.lincoln.mkz_2020", 4, true),
        vehicle("vehicle.mini.cooper_s", 4, true),
        vehicle("vehicle.carlamotors.firetruck", 4, false),
        vehicle("vehicle.bh.crossbike", 2, false),
        vehicle("vehicle.yamaha.yzf", 2, true),
        prop("static.prop.constructioncone"),
        prop("static.prop.streetbarrier"),
        prop("static.prop.box01"),
        prop("static.prop.box02"),
        prop("static.prop.box03"),
        prop("static.prop.barrel"),
        prop("static.prop.trashcan01"),
        prop("static.prop.trashcan02"),
        prop("static.prop.tire"),
        prop("static.prop.warningconstruction"),
        prop("static.prop.warningaccident"),
        Blueprint::new(WALKER_CONTROLLER_ID),
    ];

    for index in 1..=8 {
        // Older pedestrian models predate the invincibility flag
        blueprints.push(pedestrian(
            &format!("walker.pedestrian.{index:04}"),
            index % 4 != 0,
        ));
    }

    BlueprintLibrary::new(blueprints)
}
