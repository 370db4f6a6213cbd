//! Load-time consistency checks for a [`Ruleset`].
//!
//! Runs once, right after the sections have been indexed. Any failure is a
//! configuration error and aborts startup; once a ruleset has passed these
//! checks the simulation can look up every id it finds in the ruleset
//! without handling dangling references.

use colonia_types::{GoodsTypeId, UnitRole};

use crate::error::RulesError;
use crate::ruleset::{EffectAction, Ruleset};

/// Validate every cross-reference and value range of `rules`.
pub fn validate(rules: &Ruleset) -> Result<(), RulesError> {
    check_options(rules)?;
    check_tiles(rules)?;
    check_units(rules)?;
    check_buildings(rules)?;
    check_effects(rules)?;
    check_disasters(rules)?;
    Ok(())
}

fn goods_ref(rules: &Ruleset, id: &GoodsTypeId, referenced_by: &str) -> Result<(), RulesError> {
    if rules.goods().contains(id) {
        Ok(())
    } else {
        Err(RulesError::UnknownReference {
            kind: "goods",
            id: id.to_string(),
            referenced_by: String::from(referenced_by),
        })
    }
}

fn probability(value: u32, context: impl FnOnce() -> String) -> Result<(), RulesError> {
    if value > 100 {
        return Err(RulesError::InvalidProbability {
            context: context(),
            probability: i64::from(value),
        });
    }
    Ok(())
}

fn weight(value: u32, context: impl FnOnce() -> String) -> Result<(), RulesError> {
    if value == 0 {
        return Err(RulesError::NonPositiveWeight {
            context: context(),
            weight: 0,
        });
    }
    Ok(())
}

fn check_options(rules: &Ruleset) -> Result<(), RulesError> {
    probability(rules.options().natural_disaster_pct, || {
        String::from("options.natural_disaster_pct")
    })?;
    if rules.options().tension_decay < 0 {
        return Err(RulesError::InvalidValue {
            context: String::from("options.tension_decay"),
            reason: String::from("decay cannot be negative"),
        });
    }
    if rules.colony().liberty_per_rebel == 0 {
        return Err(RulesError::InvalidValue {
            context: String::from("colony.liberty_per_rebel"),
            reason: String::from("must be positive"),
        });
    }
    if rules.movement().points_per_move == 0 {
        return Err(RulesError::InvalidValue {
            context: String::from("movement.points_per_move"),
            reason: String::from("must be positive"),
        });
    }
    let combat = rules.combat();
    if combat.ship_repair_turns == 0 {
        return Err(RulesError::InvalidValue {
            context: String::from("combat.ship_repair_turns"),
            reason: String::from("must be positive"),
        });
    }
    weight(combat.normal_result_weight, || {
        String::from("combat.normal_result_weight")
    })?;
    if !rules.units().is_empty() && !rules.units().contains(&rules.colony().born_unit) {
        return Err(RulesError::UnknownReference {
            kind: "unit type",
            id: rules.colony().born_unit.to_string(),
            referenced_by: String::from("colony.born_unit"),
        });
    }
    let colony = rules.colony();
    if !rules.goods().is_empty() {
        goods_ref(rules, &colony.build_goods, "colony.build_goods")?;
        goods_ref(rules, &colony.build_tools, "colony.build_tools")?;
    }
    Ok(())
}

fn check_tiles(rules: &Ruleset) -> Result<(), RulesError> {
    for tile in rules.tiles().iter() {
        let owner = format!("tile type {}", tile.id);
        if let Some(category) = &tile.work_category
            && !rules.work_categories().contains(category.as_str())
        {
            return Err(RulesError::UnknownReference {
                kind: "work category",
                id: category.clone(),
                referenced_by: owner,
            });
        }
        for goods in tile
            .production
            .keys()
            .chain(tile.forest_production.keys())
            .chain(tile.centre_goods.iter())
        {
            goods_ref(rules, goods, &owner)?;
        }
        for choice in &tile.disasters {
            if !rules.disasters().contains(&choice.disaster) {
                return Err(RulesError::UnknownReference {
                    kind: "disaster",
                    id: choice.disaster.to_string(),
                    referenced_by: owner,
                });
            }
            weight(choice.probability, || format!("{owner} disaster {}", choice.disaster))?;
        }
    }

    for resource in rules.resources().iter() {
        let owner = format!("resource {}", resource.id);
        for goods in resource.bonuses.keys() {
            goods_ref(rules, goods, &owner)?;
        }
    }
    Ok(())
}

fn check_units(rules: &Ruleset) -> Result<(), RulesError> {
    for unit in rules.units().iter() {
        let owner = format!("unit type {}", unit.id);
        for target in [&unit.promotion, &unit.demoted_to].into_iter().flatten() {
            if !rules.units().contains(target) {
                return Err(RulesError::UnknownReference {
                    kind: "unit type",
                    id: target.to_string(),
                    referenced_by: owner,
                });
            }
        }
        if let Some(goods) = &unit.expert_goods {
            goods_ref(rules, goods, &owner)?;
        }
    }

    for role in rules.roles() {
        let owner = format!("role {}", role.role.key());
        if role.role == UnitRole::Default && !role.required_goods.is_empty() {
            return Err(RulesError::InvalidValue {
                context: owner,
                reason: String::from("the default role cannot require goods"),
            });
        }
        for goods in role.required_goods.keys() {
            goods_ref(rules, goods, &owner)?;
        }
    }
    Ok(())
}

fn check_buildings(rules: &Ruleset) -> Result<(), RulesError> {
    for building in rules.buildings().iter() {
        let owner = format!("building {}", building.id);
        let invalid = |reason: String| RulesError::InvalidBuilding {
            building: building.id.to_string(),
            reason,
        };
        if building.levels.is_empty() {
            return Err(invalid(String::from("no levels defined")));
        }
        let max = building.max_level();
        if building.initial_level > max {
            return Err(invalid(format!(
                "initial level {} exceeds max level {max}",
                building.initial_level
            )));
        }
        if let Some(factory) = building.factory_level
            && (factory == 0 || factory > max)
        {
            return Err(invalid(format!(
                "factory level {factory} outside levels 1..={max}"
            )));
        }
        if building.input.is_some() && building.output.is_none() {
            return Err(invalid(String::from("input without output")));
        }
        for goods in building.input.iter().chain(building.output.iter()) {
            goods_ref(rules, goods, &owner)?;
        }
    }
    Ok(())
}

fn check_effects(rules: &Ruleset) -> Result<(), RulesError> {
    for effect in rules.effects().iter() {
        let context = || format!("effect {}", effect.id);
        probability(effect.probability, context)?;
        match &effect.action {
            EffectAction::LossOfGoods { percent }
            | EffectAction::ProductionPenalty { percent, .. } => {
                probability(*percent, || format!("effect {} percent", effect.id))?;
            }
            EffectAction::Unrest { amount } if *amount < 0 => {
                return Err(RulesError::InvalidValue {
                    context: context(),
                    reason: String::from("unrest cannot be negative"),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_disasters(rules: &Ruleset) -> Result<(), RulesError> {
    for disaster in rules.disasters().iter() {
        if disaster.effects.is_empty() {
            return Err(RulesError::EmptyDisaster(disaster.id.to_string()));
        }
        for choice in &disaster.effects {
            let Some(effect) = rules.effect(choice.effect.as_str()) else {
                return Err(RulesError::UnknownReference {
                    kind: "effect",
                    id: choice.effect.to_string(),
                    referenced_by: format!("disaster {}", disaster.id),
                });
            };
            probability(choice.probability, || {
                format!("disaster {} effect {}", disaster.id, choice.effect)
            })?;
            weight(choice.probability, || {
                format!("disaster {} effect {}", disaster.id, choice.effect)
            })?;
            if choice.probability != effect.probability {
                return Err(RulesError::EffectProbabilityMismatch {
                    disaster: disaster.id.to_string(),
                    effect: choice.effect.to_string(),
                    choice_probability: choice.probability,
                    effect_probability: effect.probability,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const BASE: &str = "
goods:
  - id: food
    food: true
  - id: furs
  - id: hammers
  - id: tools
tiles:
  - id: plains
    move_cost: 3
    production: { food: 5 }
    disasters:
      - { disaster: flood, probability: 10 }
units:
  - id: free_colonist
    moves: 3
    person: true
effects:
  - id: lose_food
    probability: 60
    action: { kind: loss_of_goods, percent: 50 }
  - id: riot
    probability: 40
    action: { kind: unrest, amount: 100 }
";

    fn with_disaster(disaster: &str) -> String {
        format!("{BASE}disasters:\n{disaster}")
    }

    #[test]
    fn consistent_disaster_loads() {
        let yaml = with_disaster(
            "  - id: flood
    number_of_effects: one
    effects:
      - { effect: lose_food, probability: 60 }
      - { effect: riot, probability: 40 }
",
        );
        assert!(Ruleset::parse(&yaml).is_ok());
    }

    #[test]
    fn effect_probability_mismatch_is_rejected() {
        let yaml = with_disaster(
            "  - id: flood
    number_of_effects: one
    effects:
      - { effect: lose_food, probability: 50 }
",
        );
        match Ruleset::parse(&yaml) {
            Err(RulesError::EffectProbabilityMismatch {
                disaster,
                effect,
                choice_probability,
                effect_probability,
            }) => {
                assert_eq!(disaster, "flood");
                assert_eq!(effect, "lose_food");
                assert_eq!(choice_probability, 50);
                assert_eq!(effect_probability, 60);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_disaster_is_rejected() {
        let yaml = with_disaster("  - id: flood\n    number_of_effects: all\n    effects: []\n");
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::EmptyDisaster(id)) if id == "flood"
        ));
    }

    #[test]
    fn unknown_effect_is_rejected() {
        let yaml = with_disaster(
            "  - id: flood
    number_of_effects: one
    effects:
      - { effect: locusts, probability: 60 }
",
        );
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::UnknownReference { kind: "effect", .. })
        ));
    }

    #[test]
    fn unknown_tile_disaster_is_rejected() {
        // The tile refers to `flood`, which is not defined.
        assert!(matches!(
            Ruleset::parse(BASE),
            Err(RulesError::UnknownReference { kind: "disaster", .. })
        ));
    }

    #[test]
    fn out_of_range_effect_probability_is_rejected() {
        let yaml = BASE.replace("probability: 60", "probability: 160");
        let yaml = with_disaster_ok(&yaml);
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::InvalidProbability { .. })
        ));
    }

    fn with_disaster_ok(base: &str) -> String {
        format!(
            "{base}disasters:\n  - id: flood\n    number_of_effects: all\n    effects:\n      - {{ effect: riot, probability: 40 }}\n"
        )
    }

    #[test]
    fn building_without_levels_is_rejected() {
        let yaml = format!(
            "{}buildings:\n  - id: chapel\n    levels: []\n",
            with_disaster_ok(BASE)
        );
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::InvalidBuilding { .. })
        ));
    }

    #[test]
    fn factory_level_outside_levels_is_rejected() {
        let yaml = format!(
            "{}buildings:\n  - id: mill\n    factory_level: 3\n    levels:\n      - {{ name: mill }}\n",
            with_disaster_ok(BASE)
        );
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::InvalidBuilding { .. })
        ));
    }

    #[test]
    fn unknown_goods_reference_is_rejected() {
        let yaml = with_disaster_ok(&BASE.replace("production: { food: 5 }", "production: { gold: 5 }"));
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::UnknownReference { kind: "goods", .. })
        ));
    }

    #[test]
    fn unknown_build_goods_are_rejected() {
        let yaml = with_disaster_ok(&format!("colony:\n  build_goods: planks\n{BASE}"));
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::UnknownReference { kind: "goods", .. })
        ));
    }

    #[test]
    fn zero_weight_tile_disaster_is_rejected() {
        let yaml = with_disaster_ok(&BASE.replace("disaster: flood, probability: 10", "disaster: flood, probability: 0"));
        assert!(matches!(
            Ruleset::parse(&yaml),
            Err(RulesError::NonPositiveWeight { .. })
        ));
    }
}
