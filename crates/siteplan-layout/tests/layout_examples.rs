//! End-to-end layout scenarios over the public API.

use std::sync::Arc;

use siteplan_core::{Catalog, LayoutConfig, QuantityConfig, UnitType};
use siteplan_layout::{
    Footprint, ItemSequence, LayoutEngine, LayoutMode, NoopReason, PlacementItem,
    SequenceOutcome, ViewportFilter, compute_layout, row_count,
};

fn catalog_abc() -> Catalog {
    Catalog::new([
        UnitType::battery("a", "A", 10.0, 10.0, 1.0, 1.0),
        UnitType::battery("b", "B", 30.0, 10.0, 1.0, 1.0),
    ])
    .expect("valid catalog")
}

#[test]
fn auto_pack_places_long_unit_alone() {
    let catalog = catalog_abc();
    let config = LayoutConfig::default().with_max_row_width(30.0);
    let short = Arc::clone(catalog.get("a").expect("a"));
    let long = Arc::clone(catalog.get("b").expect("b"));
    let items = [
        PlacementItem::new("A", Arc::clone(&short)),
        PlacementItem::new("B", long),
        PlacementItem::new("C", short),
    ];

    let placed = compute_layout(&catalog, &config, &items, LayoutMode::Auto);
    let rows: Vec<_> = placed.iter().map(|p| (p.id.as_str(), p.row, p.x)).collect();
    assert_eq!(rows, [("B", 0, 0.0), ("A", 1, 0.0), ("C", 1, 12.0)]);
}

#[test]
fn manual_mode_wraps_third_megapack_xl() {
    let catalog = Catalog::standard();
    let xl = Arc::clone(catalog.get("megapack-xl").expect("xl"));
    let items: Vec<_> = (0..3)
        .map(|i| PlacementItem::new(format!("megapack-xl-{i}"), Arc::clone(&xl)))
        .collect();
    let placed = compute_layout(
        &catalog,
        &LayoutConfig::default(),
        &items,
        LayoutMode::Manual,
    );
    assert_eq!(placed[2].row, 1);
    assert_eq!(placed[2].x, 0.0);
    assert_eq!(placed[2].y, 12.0);
}

#[test]
fn reorder_then_recompute_changes_manual_layout() {
    let catalog = Catalog::standard();
    let quantities =
        QuantityConfig::from_pairs(&catalog, [("megapack-xl", 2), ("powerpack", 2)])
            .expect("known units");
    let mut sequence = ItemSequence::expand(&catalog, &quantities);
    let engine = LayoutEngine::new(&catalog, &LayoutConfig::default());

    let before = engine.compute(sequence.items(), LayoutMode::Manual);
    assert_eq!(row_count(&before), 2);

    let outcome = sequence.move_to_position("transformer-0", "megapack-xl-0");
    assert_eq!(outcome, SequenceOutcome::Moved { from: 4, to: 0 });
    let after = engine.compute(sequence.items(), LayoutMode::Manual);
    assert_eq!(after[0].id, "transformer-0");
    assert_eq!(after[1].x, 12.0);

    // Auto mode ignores the manual order.
    assert_eq!(
        engine.compute(sequence.items(), LayoutMode::Auto),
        engine.compute(
            ItemSequence::expand(&catalog, &quantities).items(),
            LayoutMode::Auto
        )
    );
}

#[test]
fn stale_reorder_after_reset_is_ignored() {
    let catalog = Catalog::standard();
    let quantities =
        QuantityConfig::from_pairs(&catalog, [("megapack", 1)]).expect("known units");
    let mut sequence = ItemSequence::expand(&catalog, &quantities);
    assert_eq!(
        sequence.move_to_end("megapack-7"),
        SequenceOutcome::Unchanged(NoopReason::UnknownSource)
    );
    assert_eq!(
        sequence.move_to_end("megapack-0"),
        SequenceOutcome::Unchanged(NoopReason::AlreadyLast)
    );
}

#[test]
fn empty_layout_has_zero_footprint_and_nothing_visible() {
    let catalog = Catalog::standard();
    let config = LayoutConfig::default();
    let placed = compute_layout(&catalog, &config, &[], LayoutMode::Auto);
    assert!(placed.is_empty());
    assert_eq!(Footprint::from_placements(&placed), Footprint::default());
    assert!(
        ViewportFilter::from_config(&config)
            .visible(&placed, 0.0)
            .is_empty()
    );
}

#[test]
fn viewport_never_alters_placements() {
    let catalog = Catalog::standard();
    let config = LayoutConfig::default();
    let quantities =
        QuantityConfig::from_pairs(&catalog, [("megapack-2", 800)]).expect("known units");
    let sequence = ItemSequence::expand(&catalog, &quantities);
    let placed = compute_layout(&catalog, &config, sequence.items(), LayoutMode::Auto);
    let snapshot = placed.clone();

    let filter = ViewportFilter::from_config(&config);
    let visible = filter.visible(&placed, 1_500.0);
    assert!(!visible.is_empty());
    for p in visible {
        let original = snapshot.iter().find(|s| s.id == p.id).expect("same id");
        assert_eq!(p, original);
    }
    assert_eq!(placed, snapshot);
}
