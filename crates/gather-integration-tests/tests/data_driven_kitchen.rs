//! Integration test: a kitchen built entirely from data files.
//!
//! Items come from RON, recipes from TOML, meals from JSON, ranks from RON
//! and the tuning from a TOML kitchen config. The loaded catalog then runs
//! a real shift through `gather-core`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gather_core::catalog::{IngredientCategory, StationKind};
use gather_core::fixed::secs;
use gather_core::kitchen::Kitchen;
use gather_core::station::Pose;
use gather_data::{DataLoadError, load_kitchen_data};

const ITEMS: &str = r#"[
    (name: "Lettuce", category: Vegetable),
    (name: "Chopped Lettuce", category: Vegetable, plate_role: Top),
    (name: "Tomato", category: Vegetable),
    (name: "Sliced Tomato", category: Vegetable, plate_role: Top),
    (name: "Bread", category: Carb, plate_role: Main),
    (name: "Salt", category: Spice, can_get_dirty: false),
    (name: "Plate", ingredient: false, can_get_dirty: false, max_stack: Some(1)),
]"#;

const RECIPES: &str = r#"
[[recipes]]
name = "Chopped Lettuce"
stations = ["Cutting"]
inputs = [["Lettuce", 1]]
outputs = [["Chopped Lettuce", 1]]
progress_steps = 2

[[recipes]]
name = "Sliced Tomato"
stations = ["Cutting"]
inputs = [{ item = "Tomato", amount = 1 }]
outputs = [{ item = "Sliced Tomato", amount = 1 }]
progress_steps = 2
"#;

const MEALS: &str = r#"[
    {"name": "Salad", "items": ["Chopped Lettuce"], "categories": ["Vegetable"]},
    {"name": "Tomato Bread", "items": ["Bread", "Sliced Tomato"], "complexity": "Medium"}
]"#;

const RANKS: &str = r#"[
    (name: "Prep Cook", max_orders_active: 1, meals: ["Salad"]),
    (name: "Sous Chef", min_meals_delivered: 1, max_orders_active: 2, meals: ["Tomato Bread"]),
]"#;

const KITCHEN: &str = r#"
inventory_slots = 3
delivery_reward = 20
starting_money = 0

[orders]
min_interval = 5.0
max_interval = 5.0
min_window = 60.0
max_window = 60.0
"#;

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gather_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_data(dir: &Path) {
    fs::write(dir.join("items.ron"), ITEMS).unwrap();
    fs::write(dir.join("recipes.toml"), RECIPES).unwrap();
    fs::write(dir.join("meals.json"), MEALS).unwrap();
    fs::write(dir.join("ranks.ron"), RANKS).unwrap();
    fs::write(dir.join("kitchen.toml"), KITCHEN).unwrap();
}

#[test]
fn mixed_format_directory_runs_a_shift() {
    let dir = make_test_dir("shift");
    write_data(&dir);
    let data = load_kitchen_data(&dir).unwrap();
    let _ = fs::remove_dir_all(&dir);

    let catalog = Arc::new(data.catalog);
    assert_eq!(catalog.recipes_for_station(StationKind::Cutting).len(), 2);
    assert_eq!(catalog.rank_count(), 2);
    let lettuce = catalog.item_id("Lettuce").unwrap();
    let tomato = catalog.item_id("Tomato").unwrap();
    let plate = catalog.item_id("Plate").unwrap();
    let salad = catalog.meal_id("Salad").unwrap();
    let tomato_bread = catalog.meal_id("Tomato Bread").unwrap();
    assert_eq!(catalog.category(tomato), IngredientCategory::Vegetable);

    let mut k = Kitchen::new(Arc::clone(&catalog), data.config).unwrap();
    assert_eq!(k.inventory().len(), 3);
    assert_eq!(k.wallet().money(), 0);
    assert_eq!(k.orders().max_active(), 1);

    k.step(secs(0.1));
    assert_eq!(k.orders().orders()[0].meal(), salad);

    let board = k.add_station(StationKind::Cutting, 1, Pose::default());
    k.pick_up(lettuce, 1, false).unwrap();
    k.interact(board).unwrap();
    k.interact_alternate(board).unwrap();
    k.interact_alternate(board).unwrap();
    let chopped = catalog.item_id("Chopped Lettuce").unwrap();
    assert_eq!(
        k.station(board).unwrap().occupants()[0].item(),
        Some(chopped)
    );

    k.take_plate(plate).unwrap();
    k.interact(board).unwrap();
    k.pick_up(tomato, 1, false).unwrap();
    assert!(k.deliver().is_ok());

    assert_eq!(k.wallet().money(), 20);
    assert_eq!(k.ranks().current(), catalog.rank_ids().nth(1));
    assert_eq!(k.orders().max_active(), 2);
    assert!(k.orders().unlocked_meals().contains(&tomato_bread));
    assert_eq!(k.cookbook().progress(&catalog), (1, 2));
}

#[test]
fn a_missing_meal_reference_names_the_rank_file() {
    let dir = make_test_dir("bad_rank");
    write_data(&dir);
    fs::write(
        dir.join("ranks.ron"),
        r#"[(name: "Prep Cook", meals: ["Soup"])]"#,
    )
    .unwrap();

    let err = load_kitchen_data(&dir).unwrap_err();
    let _ = fs::remove_dir_all(&dir);
    match err {
        DataLoadError::UnresolvedRef {
            file,
            name,
            expected_kind,
        } => {
            assert!(file.ends_with("ranks.ron"));
            assert_eq!(name, "Soup");
            assert_eq!(expected_kind, "meal");
        }
        other => panic!("expected an unresolved reference, got {other}"),
    }
}
