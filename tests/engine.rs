use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gol_engine::application::GenerationEngine;
use gol_engine::domain::{LifeRule, RuleSet, presets, rle};

fn engine(width: usize, height: usize) -> GenerationEngine {
    GenerationEngine::with_rules(width, height, RuleSet::new().into_shared(), 4).unwrap()
}

/// Write cells given in the external frame.
fn set_cells(engine: &mut GenerationEngine, cells: &[(i64, i64)]) {
    for &(x, y) in cells {
        let (ox, oy) = engine.origin();
        engine.set_cell_state(ox + x, oy + y, true);
    }
}

fn live(engine: &GenerationEngine) -> HashSet<(i64, i64)> {
    engine.live_cells().into_iter().collect()
}

fn set_of(cells: &[(i64, i64)]) -> HashSet<(i64, i64)> {
    cells.iter().copied().collect()
}

fn step_naive(cells: &HashSet<(i64, i64)>, rule: &LifeRule) -> HashSet<(i64, i64)> {
    let mut candidates = HashSet::new();
    for &(x, y) in cells {
        for dy in -1..=1 {
            for dx in -1..=1 {
                candidates.insert((x + dx, y + dy));
            }
        }
    }

    let mut next = HashSet::new();
    for (x, y) in candidates {
        let mut neighbours = 0u8;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0) && cells.contains(&(x + dx, y + dy)) {
                    neighbours += 1;
                }
            }
        }
        if rule.evaluate(cells.contains(&(x, y)), neighbours).unwrap() {
            next.insert((x, y));
        }
    }
    next
}

#[test]
fn blinker_oscillates() {
    let mut engine = engine(16, 16);
    set_cells(&mut engine, &[(1, 0), (1, 1), (1, 2)]);

    engine.next_generation().unwrap();
    assert_eq!(live(&engine), set_of(&[(0, 1), (1, 1), (2, 1)]));

    engine.next_generation().unwrap();
    assert_eq!(live(&engine), set_of(&[(1, 0), (1, 1), (1, 2)]));
    assert_eq!(engine.generation_no(), 2);
}

#[test]
fn glider_translates_after_four_ticks() {
    let glider = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
    let mut engine = engine(64, 64);
    set_cells(&mut engine, &glider);

    for _ in 0..4 {
        engine.next_generation().unwrap();
    }

    let moved: Vec<_> = glider.iter().map(|&(x, y)| (x + 1, y + 1)).collect();
    assert_eq!(engine.population(), 5);
    assert_eq!(live(&engine), set_of(&moved));
}

#[test]
fn glider_grows_grid_up_and_left() {
    // Northwest-bound glider starting in the corner forces growth on the
    // left and top while the grid keeps the external frame stable.
    let glider = [(0, 0), (1, 0), (2, 0), (0, 1), (1, 2)];
    let mut engine = engine(8, 8);
    set_cells(&mut engine, &glider);

    let mut expected = set_of(&glider);
    for _ in 0..40 {
        engine.next_generation().unwrap();
        expected = step_naive(&expected, &LifeRule::CONWAY);
    }
    assert_eq!(live(&engine), expected);
    assert!(engine.origin().0 >= 64);
    assert!(engine.origin().1 >= 10);
}

#[test]
fn left_expansion_keeps_cell_reachable() {
    let mut engine = engine(64, 4);
    engine.set_cell_state(-1, 0, true);

    assert_eq!(engine.width(), 128);
    assert!(engine.cell_state(63, 0));
    assert_eq!(engine.live_cells(), vec![(-1, 0)]);
}

#[test]
fn sub_word_negative_offsets_align() {
    let mut engine = engine(64, 4);
    engine.set_cell_state(5, 1, true);
    engine.set_cell_state(-70, 1, true);

    // -70 needs two words on the left
    assert_eq!(engine.origin(), (128, 0));
    assert!(engine.cell_state(58, 1));
    assert!(engine.cell_state(133, 1));
    assert_eq!(engine.live_cells(), vec![(-70, 1), (5, 1)]);
}

#[test]
fn clear_is_idempotent() {
    let mut engine = engine(64, 64);
    set_cells(&mut engine, &[(3, 3), (4, 3), (5, 3)]);
    engine.next_generation().unwrap();
    let extent = (engine.width(), engine.height());

    engine.clear();
    let once = (engine.live_cells(), engine.generation_no());
    engine.clear();
    assert_eq!((engine.live_cells(), engine.generation_no()), once);
    assert_eq!(engine.generation_no(), 0);
    assert_eq!((engine.width(), engine.height()), extent);

    // Nothing is active after a clear, so an empty grid stays empty.
    engine.next_generation().unwrap();
    assert_eq!(engine.population(), 0);
}

#[test]
fn reset_size_returns_to_default_extent() {
    let mut engine = engine(40, 30);
    engine.set_cell_state(-5, -5, true);
    engine.set_cell_state(500, 90, true);
    engine.next_generation().unwrap();

    engine.reset_size();
    assert_eq!((engine.width(), engine.height()), (40, 30));
    assert_eq!(engine.origin(), (0, 0));
    assert_eq!(engine.generation_no(), 0);
    assert_eq!(engine.population(), 0);
}

#[test]
fn pattern_round_trip() {
    let pattern = rle::decode_str("#N Sample\nx = 70, y = 3\n3o64b3o$bo$68bo!").unwrap();
    let mut engine = engine(16, 16);
    engine.set_pattern(&pattern);

    let expected: HashSet<(i64, i64)> = pattern
        .live_cells()
        .into_iter()
        .map(|(x, y)| (x as i64, y as i64))
        .collect();
    assert_eq!(expected.len(), 8);
    assert_eq!(live(&engine), expected);
}

#[test]
fn gosper_gun_emits_gliders() {
    let pattern = presets::glider_gun().pattern().unwrap();
    let mut engine = engine(64, 32);
    engine.set_pattern(&pattern);

    let mut expected: HashSet<(i64, i64)> = live(&engine);
    for _ in 0..120 {
        engine.next_generation().unwrap();
        expected = step_naive(&expected, &LifeRule::CONWAY);
    }
    assert_eq!(live(&engine), expected);
    assert!(engine.population() > 36);
    // gliders leave toward the bottom right, so the grid grew that way
    assert!(engine.width() > 64);
    assert!(engine.height() > 32);
}

#[test]
fn rule_change_applies_next_tick() {
    let mut engine = engine(16, 16);
    // Under B36/S23 a dead cell with six neighbours is born.
    set_cells(&mut engine, &[(0, 0), (1, 0), (2, 0), (0, 2), (1, 2), (2, 2)]);
    assert!(engine.set_rule_string(Some("B36/S23")));
    engine.next_generation().unwrap();
    assert!(live(&engine).contains(&(1, 1)));
}

#[test]
fn matches_naive_stepper_on_random_soups() {
    for seed in [1u64, 7, 42] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut engine = engine(64, 48);
        let mut cells = HashSet::new();
        for _ in 0..600 {
            let cell = (rng.random_range(0..64), rng.random_range(0..48));
            cells.insert(cell);
        }
        set_cells(&mut engine, &cells.iter().copied().collect::<Vec<_>>());

        let mut expected = cells;
        for generation in 1..=30 {
            engine.next_generation().unwrap();
            expected = step_naive(&expected, &LifeRule::CONWAY);
            assert_eq!(live(&engine), expected, "seed {seed}, generation {generation}");
        }
    }
}

#[test]
fn matches_naive_stepper_under_other_rules() {
    for rule_string in ["B36/S23", "S1357/B1357", "B2/S"] {
        let rule = LifeRule::parse(rule_string).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut engine = engine(32, 32);
        engine.set_rule_string(Some(rule_string));

        let mut cells = HashSet::new();
        for _ in 0..80 {
            cells.insert((rng.random_range(10..22), rng.random_range(10..22)));
        }
        set_cells(&mut engine, &cells.iter().copied().collect::<Vec<_>>());

        let mut expected = cells;
        for generation in 1..=8 {
            engine.next_generation().unwrap();
            expected = step_naive(&expected, &rule);
            assert_eq!(live(&engine), expected, "{rule_string}, generation {generation}");
        }
    }
}

#[test]
fn worker_count_does_not_change_result() {
    let rules = || RuleSet::new().into_shared();
    let mut single = GenerationEngine::with_rules(100, 100, rules(), 1).unwrap();
    let mut many = GenerationEngine::with_rules(100, 100, rules(), 7).unwrap();
    let pattern = presets::acorn().pattern().unwrap();
    single.set_pattern(&pattern);
    many.set_pattern(&pattern);

    for _ in 0..60 {
        single.next_generation().unwrap();
        many.next_generation().unwrap();
    }
    assert_eq!(single.live_cells(), many.live_cells());
}
