//! Kitchen shift example: a scripted cook works through the order queue.
//!
//! Places a frying pan and a cutting board, then serves every order that
//! comes in for two simulated minutes: omelets from raw eggs, sandwiches
//! assembled on the plate, tomato toast from freshly sliced tomatoes.
//! Listeners log orders, rank-ups and money through `tracing`. At the end
//! the kitchen is saved, reloaded, and the two are compared.
//!
//! Run with: `RUST_LOG=info cargo run -p gather-core --example kitchen_shift --features test-utils`

use std::sync::Arc;

use gather_core::catalog::{Catalog, StationKind};
use gather_core::event::{Event, EventKind};
use gather_core::fixed::{Seconds, fixed64_to_f64, secs};
use gather_core::id::*;
use gather_core::kitchen::Kitchen;
use gather_core::processing::{CookState, ProcessingState};
use gather_core::rejection::Rejection;
use gather_core::station::Pose;
use gather_core::test_utils::*;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const SHIFT_SECONDS: f64 = 120.0;
const MAX_COOK_STEPS: usize = 100;

fn dt() -> Seconds {
    secs(0.25)
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let catalog = Arc::new(sample_catalog());
    let mut kitchen =
        Kitchen::new(Arc::clone(&catalog), test_config()).expect("sample config is valid");
    attach_loggers(&mut kitchen, &catalog);

    let pan = kitchen.add_station(StationKind::FryingPan, 3, Pose::at(0.0, 0.0, 1.0));
    let board = kitchen.add_station(StationKind::Cutting, 1, Pose::at(2.0, 0.0, 1.0));

    while fixed64_to_f64(kitchen.elapsed()) < SHIFT_SECONDS {
        kitchen.step(dt());
        let Some(meal) = kitchen.orders().orders().first().map(|o| o.meal()) else {
            continue;
        };
        if let Err(rejection) = serve(&mut kitchen, meal, pan, board) {
            warn!(meal = catalog.get_meal(meal).map(|m| m.name.as_str()), ?rejection, "could not serve");
            let _ = kitchen.trash();
        }
    }

    let (found, total) = kitchen.cookbook().progress(&catalog);
    info!(
        delivered = kitchen.ranks().delivered(),
        money = kitchen.wallet().money(),
        recipes_found = found,
        recipes_total = total,
        "shift over"
    );

    let bytes = kitchen.save().expect("kitchen saves");
    let restored =
        Kitchen::load(Arc::clone(&catalog), test_config(), &bytes).expect("save loads back");
    assert_eq!(restored.ranks().delivered(), kitchen.ranks().delivered());
    assert_eq!(restored.wallet().money(), kitchen.wallet().money());
    assert_eq!(restored.orders().orders().len(), kitchen.orders().orders().len());
    info!(bytes = bytes.len(), "save round trip ok");
}

/// Prepare one plate of `meal` and hand it in.
fn serve(kitchen: &mut Kitchen, meal: MealId, pan: StationId, board: StationId) -> Result<OrderId, Rejection> {
    if meal == omelet_plate() {
        kitchen.pick_up(raw_egg(), 1, false)?;
        kitchen.interact(pan)?;
        for _ in 0..MAX_COOK_STEPS {
            if omelet_ready(kitchen, pan) {
                break;
            }
            kitchen.step(dt());
        }
        kitchen.take_plate(plate_item())?;
        kitchen.interact(pan)?;
    } else if meal == sandwich() {
        kitchen.take_plate(plate_item())?;
        for item in [bread(), cheese(), lettuce()] {
            kitchen.pick_up(item, 1, false)?;
        }
    } else if meal == tomato_toast() {
        kitchen.pick_up(tomato(), 1, false)?;
        kitchen.interact(board)?;
        for _ in 0..3 {
            kitchen.interact_alternate(board)?;
        }
        kitchen.take_plate(plate_item())?;
        kitchen.pick_up(bread(), 1, false)?;
        kitchen.interact(board)?;
    }
    kitchen.deliver()
}

fn omelet_ready(kitchen: &Kitchen, pan: StationId) -> bool {
    kitchen.station(pan).is_some_and(|station| match station.processing() {
        ProcessingState::Cooking(m) => m.state == CookState::Finished,
        _ => false,
    })
}

fn attach_loggers(kitchen: &mut Kitchen, catalog: &Arc<Catalog>) {
    let names = Arc::clone(catalog);
    kitchen.event_bus.on(
        EventKind::OrderCreated,
        Box::new(move |e: &Event| {
            if let Event::OrderCreated { meal, time_limit, .. } = e {
                let meal = names.get_meal(*meal).map_or("?", |m| m.name.as_str());
                info!(meal, seconds = fixed64_to_f64(*time_limit), "new order");
            }
        }),
    );

    let names = Arc::clone(catalog);
    kitchen.event_bus.on(
        EventKind::RankUnlocked,
        Box::new(move |e: &Event| {
            if let Event::RankUnlocked { rank, .. } = e {
                let rank = names.get_rank(*rank).map_or("?", |r| r.name.as_str());
                info!(rank, "promoted");
            }
        }),
    );

    kitchen.event_bus.on(
        EventKind::OrderMilestone,
        Box::new(|e: &Event| {
            if let Event::OrderMilestone { order, milestone, .. } = e {
                info!(order = order.0, ?milestone, "order timer");
            }
        }),
    );

    kitchen.event_bus.on(
        EventKind::MoneyChanged,
        Box::new(|e: &Event| {
            if let Event::MoneyChanged { money, delta, .. } = e {
                info!(money, delta, "wallet");
            }
        }),
    );
}
