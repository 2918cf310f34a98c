use std::fs;
use std::path::Path;

use tempfile::TempDir;
use world::{
    load_player, save_player, Coordinate, GameConfig, InventoryItem, ItemKind, MapAtlas,
    MapBuilder, PlayerState, TerrainKind,
};

fn write_tile(dir: &Path, name: &str, body: &str) {
    fs::create_dir_all(dir).expect("tile dir");
    fs::write(dir.join(name), body).expect("tile");
}

fn island(root: &Path) {
    let main = root.join("island");
    write_tile(&main, "map 0,0.tqmap", "#- start: 1,0\n#- title: west\n.O.\n.&~\n");
    write_tile(&main, "map 1,0.tqmap", "# east half\n~~=\n~~.\n");
    write_tile(&main.join("0001,0000"), "0,0.tqmap", "#- start: 0,0\nO$\n");
}

#[test]
fn tiles_on_disk_stitch_into_one_grid() {
    let temp = TempDir::new().expect("temp");
    island(temp.path());

    let grid = MapBuilder::discover(None, temp.path().join("island"))
        .expect("discover")
        .build("island")
        .expect("build");
    assert_eq!((grid.width(), grid.height()), (6, 2));
    assert_eq!(grid.render_all(), ".O.~~=\n.&~~~.");
    assert_eq!(grid.starting_coordinate(), Coordinate::new(1, 0));
    assert_eq!(grid.metadata().get("title").map(String::as_str), Some("west"));
    assert_eq!(grid.terrain_at(-1, 0), TerrainKind::Empty);
}

#[test]
fn a_short_voyage_survives_save_and_load() {
    let temp = TempDir::new().expect("temp");
    island(temp.path());
    let mut atlas = MapAtlas::open(None, temp.path(), "island").expect("atlas");
    let config = GameConfig::default().with_initial_coins(120);

    let mut player = PlayerState::new(config);
    let main = atlas.main();
    assert!(player.move_to(main, main.starting_coordinate()).expect("start"));
    player.move_to(main, Coordinate::new(1, 1)).expect("to ship");
    player.board();
    player.deduct_coins(config.ship_cost);
    for x in 2..=4 {
        let next = Coordinate::new(x, 1);
        assert!(player.can_move_to(main, next), "{next}");
        player.move_to(main, next).expect("sail");
    }
    assert!(!player.can_move_to(main, Coordinate::new(5, 1)));
    player.disembark();
    player.items_mut().add(
        InventoryItem::new("fire boots", ItemKind::Armor { defense: 1 })
            .with_immunity(TerrainKind::Lava),
    );
    player.items_mut().add(InventoryItem::healing_potion(Some(3)));
    assert!(player.apply_item(0).expect("equip boots"));

    let child = atlas.enter_child(Coordinate::new(1, 0)).expect("cave");
    player.move_to(child, child.starting_coordinate()).expect("enter");
    player.move_to(child, Coordinate::new(1, 0)).expect("chest");
    assert!(player.interacted(child.name(), Coordinate::new(1, 0)));

    let save_path = temp.path().join("saves").join("slot.tqsave");
    save_player(&player, &save_path).expect("save");
    let mut restored = load_player(&save_path).expect("load");
    restored.configure(config);

    assert_eq!(restored, player);
    assert_eq!(restored.map_name(), "0001,0000");
    assert_eq!(restored.coins(), 20);
    assert!(restored.has_interacted("0001,0000", Coordinate::new(1, 0)));
    assert!(restored.has_visited("island", Coordinate::new(3, 1)));
    assert!(restored.immune_to(TerrainKind::Lava));
    assert!(restored.vehicle_located_at(atlas.main(), Coordinate::new(4, 1)));
    assert!(!restored.vehicle_located_at(atlas.main(), Coordinate::new(1, 1)));
    assert_eq!(atlas.exit_of(restored.map_name()), Some(Coordinate::new(1, 0)));
}
