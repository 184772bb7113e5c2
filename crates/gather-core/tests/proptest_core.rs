//! Property-based tests for the kitchen core.
//!
//! Uses proptest to generate random slot operations, held-item sets,
//! plates and order timelines, then verify the core invariants hold.

use gather_core::config::OrderConfig;
use gather_core::fixed::{Fixed64, Seconds, percent_of};
use gather_core::id::*;
use gather_core::matcher::find_match;
use gather_core::order::{ActiveOrder, MealOrderEngine, OrderMilestone};
use gather_core::plate::Plate;
use gather_core::slot::Slot;
use gather_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

const ITEM_COUNT: u32 = 14;

fn arb_item() -> impl Strategy<Value = ItemId> {
    (0..ITEM_COUNT).prop_map(ItemId)
}

#[derive(Debug, Clone)]
enum SlotOp {
    SetItem(ItemId, u32),
    Add(u32),
    Remove(u32),
    Clear,
}

fn arb_slot_op() -> impl Strategy<Value = SlotOp> {
    prop_oneof![
        (arb_item(), 0..30u32).prop_map(|(item, n)| SlotOp::SetItem(item, n)),
        (0..30u32).prop_map(SlotOp::Add),
        (0..40u32).prop_map(SlotOp::Remove),
        Just(SlotOp::Clear),
    ]
}

/// Whole seconds and fractions, so both exact and overshooting steps occur.
fn arb_dt() -> impl Strategy<Value = Seconds> {
    (1..400u32).prop_map(|quarter| Fixed64::from_num(quarter) / Fixed64::from_num(4))
}

const SCHEDULE: [(OrderMilestone, u8); 4] = [
    (OrderMilestone::Halfway, 50),
    (OrderMilestone::HurryUp, 25),
    (OrderMilestone::Critical, 10),
    (OrderMilestone::Expired, 0),
];

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// amount > 0 exactly when an item is set, whatever the operations.
    #[test]
    fn slot_amount_tracks_item(ops in proptest::collection::vec(arb_slot_op(), 1..40)) {
        let mut slot = Slot::empty();
        for op in ops {
            match op {
                SlotOp::SetItem(item, n) => slot.set_item(item, n),
                SlotOp::Add(n) => slot.add_amount(n),
                SlotOp::Remove(n) => {
                    let before = slot.amount();
                    let removed = slot.remove_amount(n);
                    prop_assert!(removed <= before);
                    prop_assert_eq!(slot.amount(), before - removed);
                }
                SlotOp::Clear => slot.clear(),
            }
            prop_assert_eq!(slot.amount() > 0, slot.item().is_some());
        }
    }

    /// A single recipe matches exactly the held multiset equal to its
    /// input types, or its alternate alone on a single-input recipe.
    #[test]
    fn matcher_agrees_with_multiset_equality(
        recipe in 0..4u32,
        held in proptest::collection::vec(arb_item(), 0..4),
    ) {
        let catalog = sample_catalog();
        let recipe = RecipeId(recipe);
        let def = catalog.get_recipe(recipe).unwrap();

        let mut wanted: Vec<ItemId> = def.inputs.iter().map(|line| line.item).collect();
        wanted.sort();
        let mut sorted = held.clone();
        sorted.sort();
        let alternate = def.inputs.len() == 1
            && def.alternate_input.is_some()
            && held.len() == 1
            && Some(held[0]) == def.alternate_input;
        let expected = !held.is_empty() && (sorted == wanted || alternate);

        prop_assert_eq!(find_match(&catalog, &held, &[recipe]) == Some(recipe), expected);
    }

    /// Extra ingredients never break a plate that already matches.
    #[test]
    fn surplus_keeps_a_plate_matching(extras in proptest::collection::vec(arb_item(), 0..5)) {
        let catalog = sample_catalog();
        let meal = catalog.get_meal(sandwich()).unwrap();
        let mut plate = Plate::new(plate_item(), 8);
        for item in [bread(), cheese(), lettuce()] {
            plate.add_ingredient(&mut Slot::new(item, 1), true).unwrap();
        }
        prop_assert!(plate.matches_meal(&catalog, meal).is_ok());

        for item in extras {
            if item == plate_item() {
                continue;
            }
            plate.add_ingredient(&mut Slot::new(item, 1), true).unwrap();
            prop_assert!(plate.matches_meal(&catalog, meal).is_ok());
        }
    }

    /// Milestones fire once each, in schedule order, only after their
    /// threshold is reached, and never after completion or expiry.
    #[test]
    fn milestones_fire_in_order(
        total in 1..600u32,
        steps in proptest::collection::vec(arb_dt(), 1..200),
        complete_at in proptest::option::of(0..200usize),
    ) {
        let total = Fixed64::from_num(total);
        let mut order = ActiveOrder::new(OrderId(0), MealId(0), total);
        let mut fired = Vec::new();

        for (i, dt) in steps.into_iter().enumerate() {
            if complete_at == Some(i) {
                order.complete();
            }
            let finished_before = order.is_finished();
            let crossed = order.advance(dt);
            if finished_before {
                prop_assert!(crossed.is_empty());
            }
            for milestone in crossed {
                let (_, percent) = SCHEDULE.iter().find(|(m, _)| *m == milestone).unwrap();
                prop_assert!(order.remaining() <= percent_of(total, *percent));
                fired.push(milestone);
            }
        }

        let expected: Vec<OrderMilestone> = SCHEDULE.iter().map(|(m, _)| *m).take(fired.len()).collect();
        prop_assert_eq!(fired, expected);
    }

    /// A plate that satisfies no order changes nothing.
    #[test]
    fn failed_delivery_is_idempotent(items in proptest::collection::vec(arb_item(), 0..4)) {
        let catalog = sample_catalog();
        let mut engine = MealOrderEngine::new(&OrderConfig::default()).unwrap();
        engine.add_unlocked_meal(tomato_toast());
        engine.tick(Seconds::ZERO, &[]);
        prop_assert_eq!(engine.orders().len(), 1);

        let mut plate = Plate::new(plate_item(), 4);
        for item in items {
            if item == sliced_tomato() || item == plate_item() {
                continue;
            }
            plate.add_ingredient(&mut Slot::new(item, 1), true).unwrap();
        }
        let before_engine = engine.clone();
        let before_plate = plate.clone();

        prop_assert!(engine.deliver(&catalog, &plate).is_err());
        prop_assert_eq!(&engine, &before_engine);
        prop_assert_eq!(&plate, &before_plate);
    }
}
