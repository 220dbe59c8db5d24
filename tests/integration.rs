use std::fs;

use bubbleshelf::app::{ViewModel, ViewSettings};
use bubbleshelf::layout::{CanvasConfig, LayoutMode, MIN_RADIUS, radius};
use bubbleshelf::library::{
    Item, JsonFileStore, MemoryStore, MergeError, SessionStore, parse_catalog_str,
};

fn two_game_catalog() -> Vec<Item> {
    parse_catalog_str(
        r#"[
            {"appid": 1, "name": "A", "minutesPlayed": 600},
            {"appid": 2, "name": "B", "minutesPlayed": 0}
        ]"#,
    )
    .unwrap()
}

fn show_all(mode: LayoutMode) -> ViewSettings {
    ViewSettings {
        mode,
        show_all: true,
        ..ViewSettings::default()
    }
}

fn heavy_tail_catalog(count: u64) -> Vec<Item> {
    let games = (0..count)
        .map(|i| {
            format!(
                r#"{{"appid": {}, "name": "Game {i}", "minutesPlayed": {}}}"#,
                100 + i,
                60.0 * 500.0 / (i as f64 + 1.0)
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    parse_catalog_str(&format!(r#"{{"games": [{games}]}}"#)).unwrap()
}

#[test]
fn two_items_pack_with_weight_sized_radii() {
    let model = ViewModel::new(
        two_game_catalog(),
        Box::new(MemoryStore::default()),
        show_all(LayoutMode::Packed),
    )
    .unwrap();

    let hours = model
        .aggregation()
        .unmerged()
        .iter()
        .map(|item| item.weight)
        .collect::<Vec<_>>();
    assert_eq!(hours, vec![10.0, 0.0]);

    let nodes = model.nodes();
    assert_eq!(nodes.len(), 2);
    let a = nodes.iter().find(|node| node.id == 1).unwrap();
    let b = nodes.iter().find(|node| node.id == 2).unwrap();
    assert!(a.r > b.r);
    assert!((b.r - MIN_RADIUS).abs() < 1e-4);
    assert!((a.r - radius(10.0, 10.0, 800.0)).abs() < 1e-3);
}

#[test]
fn session_edits_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let catalog = heavy_tail_catalog(8);

    let mut model = ViewModel::new(
        catalog.clone(),
        Box::new(JsonFileStore::new(&session_path)),
        show_all(LayoutMode::Packed),
    )
    .unwrap();
    model.add_merge(101, 100).unwrap();
    model.add_merge(102, 101).unwrap();
    model.hide(107);
    assert_eq!(
        model.add_merge(100, 102),
        Err(MergeError::MergeCycle { from: 100, to: 102 })
    );

    let saved = JsonFileStore::new(&session_path).load().unwrap();
    assert_eq!(saved.merges.len(), 2);
    assert!(saved.hidden.contains(&107));

    let reloaded = ViewModel::new(
        catalog,
        Box::new(JsonFileStore::new(&session_path)),
        show_all(LayoutMode::Packed),
    )
    .unwrap();
    let selection = reloaded.selection();
    assert_eq!(selection.len(), 5);
    assert_eq!(selection[0].id, 100);
    assert!((selection[0].weight - (500.0 + 250.0 + 500.0 / 3.0)).abs() < 1e-9);
    assert_eq!(reloaded.aggregation().merge_members(100), vec![100, 101, 102]);
}

#[test]
fn scatter_layout_settles_without_overlap() {
    let mut model = ViewModel::new(
        heavy_tail_catalog(20),
        Box::new(MemoryStore::default()),
        ViewSettings {
            mode: LayoutMode::Scatter,
            seed: 42,
            top_n: 20,
            show_all: false,
            canvas: CanvasConfig {
                width: 900.0,
                height: 700.0,
                outer_padding: 16.0,
            },
        },
    )
    .unwrap();

    while model.processing() {
        model.tick();
    }

    let nodes = model.nodes();
    assert_eq!(nodes.len(), 20);
    for (i, a) in nodes.iter().enumerate() {
        assert!(a.x - a.r >= -1e-3 && a.x + a.r <= 900.0 + 1e-3);
        assert!(a.y - a.r >= -1e-3 && a.y + a.r <= 700.0 + 1e-3);
        for b in &nodes[i + 1..] {
            let gap = (a.center() - b.center()).length() - (a.r + b.r);
            assert!(gap > -0.5, "{} and {} overlap by {}", a.id, b.id, -gap);
        }
    }
}

#[test]
fn switching_modes_keeps_continuity() {
    let mut model = ViewModel::new(
        heavy_tail_catalog(10),
        Box::new(MemoryStore::default()),
        show_all(LayoutMode::Packed),
    )
    .unwrap();
    assert!(model.transitions().iter().all(|transition| transition.is_new()));

    model.set_mode(LayoutMode::Scatter);
    assert!(model.processing());
    model.set_seed(7);
    assert!(model.tick());
    assert!(!model.tick());
    assert!(model.transitions().iter().all(|transition| !transition.is_new()));
}

#[test]
fn unreadable_session_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    fs::write(&session_path, "{ not json").unwrap();

    let error = ViewModel::new(
        two_game_catalog(),
        Box::new(JsonFileStore::new(&session_path)),
        ViewSettings::default(),
    )
    .err()
    .unwrap();
    assert!(format!("{error:#}").contains("invalid session JSON"));
}

#[test]
fn looped_session_file_loads_as_a_forest() {
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    fs::write(&session_path, r#"{"merges": {"100": 101, "101": 100, "102": 102}}"#).unwrap();

    let model = ViewModel::new(
        heavy_tail_catalog(3),
        Box::new(JsonFileStore::new(&session_path)),
        show_all(LayoutMode::Packed),
    )
    .unwrap();

    let merged = model
        .aggregation()
        .canonical()
        .iter()
        .map(|item| (item.id, item.weight))
        .collect::<Vec<_>>();
    assert_eq!(merged, vec![(101, 750.0), (102, 500.0 / 3.0)]);
}
