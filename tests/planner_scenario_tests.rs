mod common;

use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use room_planner::core::{InputEvent, PointerButton, PointerInput};
use room_planner::math::angular_distance;
use room_planner::persistence::MemorySink;
use room_planner::settings::DEFAULT_POINT_FORMAT_PRODUCT;
use room_planner::{LoaderKind, PlannerPhase, RoomConfig, RoomPlanner};

use common::*;

const SOFA_HALF: Vec3 = Vec3::new(1.0, 0.4, 0.5);
const CHAIR_HALF: Vec3 = Vec3::new(0.3, 0.45, 0.3);

fn click(planner: &mut RoomPlanner, screen: Vec2) {
    planner.handle_input(InputEvent::Pointer(PointerInput::Down {
        position: screen,
        button: PointerButton::Primary,
    }));
    planner.handle_input(InputEvent::Pointer(PointerInput::Up {
        position: screen,
        button: PointerButton::Primary,
    }));
}

#[cfg(test)]
mod planner_scenario_tests {
    use super::*;

    #[test]
    fn test_sofa_dropped_past_far_corner_is_clamped_and_saved_once() {
        let assets = glb_assets(&[("sofa-1", SOFA_HALF)]);
        let mut t = planner_with(assets, MemorySink::new(), settings());
        t.planner.configure(RoomConfig::rectangle(6.0, 3.0, 5.0)).unwrap();

        let sofa = catalog_item("sofa-1", "Sofa", 899.99);
        let screen = t.planner.screen_point(Vec3::new(2.8, -1.5, 2.3));
        assert!(t.planner.drop_catalog_item(screen, &sofa));
        t.planner.tick(STEP);

        let node = &t.planner.scene().nodes()[0];
        assert!((node.position().x - 1.9).abs() < 1e-3);
        assert!((node.position().z - 1.9).abs() < 1e-3);
        assert_eq!(node.position().y, -1.5);
        let footprint = t.planner.scene().footprint().unwrap();
        assert!(footprint.contains(&node.world_bounds()));

        // The splice restarted the debounce; a full quiet period follows it
        run(&mut t.planner, 1.25);
        assert_eq!(t.sink.save_count(), 0);
        run(&mut t.planner, STEP);
        assert_eq!(t.sink.save_count(), 1);
        run(&mut t.planner, 3.0);
        assert_eq!(t.sink.save_count(), 1);

        let blob: serde_json::Value = serde_json::from_str(&t.sink.last_blob().unwrap()).unwrap();
        let object = &blob["objects"][0];
        assert_eq!(object["productId"], "sofa-1");
        assert_eq!(object["price"], 899.99);
        assert_eq!(object["loaderType"], "meshFormat");
        assert!((object["position"]["x"].as_f64().unwrap() - 1.9).abs() < 1e-3);
    }

    #[test]
    fn test_restore_point_format_item_keeps_saved_transform() {
        let assets = Rc::new(room_planner::loaders::MemoryAssetSource::new());
        assets.insert("/models/heater/model.ply", ply_box(Vec3::new(0.2, 0.3, 0.2)));
        let blob = format!(
            r##"{{"width":6,"height":3,"depth":5,"wallColor":"#c0e0ff","floorTexture":"wood","floorColor":"#f2f2f2",
            "objects":[{{"name":"heater","displayName":"Heater","path":"/models/heater/model.ply",
            "loaderType":"pointFormat","productId":"{}","price":120,"imageUrl":"","categories":["heating"],
            "position":{{"x":1,"y":-1.5,"z":2}},"rotationY":{}}}]}}"##,
            DEFAULT_POINT_FORMAT_PRODUCT, FRAC_PI_2
        );
        let mut t = planner_with(assets.clone(), MemorySink::new().with_blob("user-1", blob), settings());

        assert!(t.planner.mount());
        assert_eq!(t.planner.phase(), PlannerPhase::Active);
        t.planner.tick(STEP);

        let nodes = t.planner.scene().nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].meta.loader_kind, LoaderKind::PointFormat);
        assert_eq!(nodes[0].model().kind, LoaderKind::PointFormat);
        assert_eq!(nodes[0].position(), Vec3::new(1.0, -1.5, 2.0));
        assert!(angular_distance(nodes[0].yaw(), FRAC_PI_2) < 1e-5);
        assert_eq!(assets.requested(), vec!["/models/heater/model.ply".to_string()]);
        assert!(t.planner.scene().room().unwrap().floor_material.texture.is_some());
    }

    #[test]
    fn test_serialize_then_restore_reproduces_furniture() {
        let assets = glb_assets(&[("sofa-1", SOFA_HALF), ("chair-1", CHAIR_HALF)]);
        let mut t = planner_with(assets.clone(), MemorySink::new(), settings());
        t.planner.configure(RoomConfig::rectangle(6.0, 3.0, 5.0)).unwrap();

        let sofa = catalog_item("sofa-1", "Sofa", 899.99);
        let chair = catalog_item("chair-1", "Chair", 149.0);
        let sofa_screen = t.planner.screen_point(Vec3::new(-1.0, -1.5, -1.0));
        let chair_screen = t.planner.screen_point(Vec3::new(1.5, -1.5, 0.5));
        t.planner.drop_catalog_item(sofa_screen, &sofa);
        t.planner.drop_catalog_item(chair_screen, &chair);
        t.planner.tick(STEP);

        let chair_top = t.planner.screen_point(Vec3::new(1.5, -1.2, 0.5));
        click(&mut t.planner, chair_top);
        assert!(t.planner.set_selected_rotation(135.0));
        let blob = t.planner.serialize().unwrap();

        let mut restored = planner_with(assets, MemorySink::new().with_blob("user-1", blob), settings());
        assert!(restored.planner.mount());
        restored.planner.tick(STEP);

        let summary = |planner: &RoomPlanner| {
            let mut items: Vec<_> = planner
                .scene()
                .nodes()
                .iter()
                .map(|n| (n.meta.product_id.clone(), n.position(), n.yaw()))
                .collect();
            items.sort_by(|a, b| a.0.cmp(&b.0));
            items
        };
        let before = summary(&t.planner);
        let after = summary(&restored.planner);
        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 2);
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.0, b.0);
            assert!((a.1 - b.1).length() < 1e-5);
            assert!(angular_distance(a.2, b.2) < 1e-5);
        }
        assert!(angular_distance(after[0].2, 135f32.to_radians()) < 1e-5);
    }

    #[test]
    fn test_full_turn_of_wheel_steps_returns_to_start() {
        let assets = glb_assets(&[("chair-1", CHAIR_HALF)]);
        let mut t = planner_with(assets, MemorySink::new(), settings());
        t.planner.configure(RoomConfig::default()).unwrap();
        t.planner.add_catalog_item(&catalog_item("chair-1", "Chair", 149.0));
        t.planner.tick(STEP);

        let screen = t.planner.screen_point(Vec3::new(0.0, -1.2, 0.0));
        click(&mut t.planner, screen);
        assert_eq!(t.planner.selected_rotation(), Some(0));

        for _ in 0..24 {
            t.planner.handle_input(InputEvent::Pointer(PointerInput::Wheel {
                position: screen,
                delta_y: -1.0,
            }));
        }
        let yaw = t.planner.scene().nodes()[0].yaw();
        assert!(angular_distance(yaw, 0.0) < 1e-4);
        assert_eq!(t.planner.selected_rotation(), Some(0));
    }

    #[test]
    fn test_burst_of_edits_saves_only_the_last_state() {
        let mut t = planner_with(glb_assets(&[]), MemorySink::new(), settings());
        t.planner.configure(RoomConfig::default()).unwrap();
        run(&mut t.planner, 2.0);
        assert_eq!(t.sink.save_count(), 1);

        for shade in ["#101010", "#202020", "#303030", "#404040", "#112233"] {
            t.planner.set_wall_color(shade).unwrap();
            t.planner.tick(STEP);
        }
        assert_eq!(t.sink.save_count(), 1);
        run(&mut t.planner, 2.0);
        assert_eq!(t.sink.save_count(), 2);

        let blob: serde_json::Value = serde_json::from_str(&t.sink.last_blob().unwrap()).unwrap();
        assert_eq!(blob["wallColor"], "#112233");
    }

    #[test]
    fn test_deleting_selection_clears_it() {
        let assets = glb_assets(&[("chair-1", CHAIR_HALF)]);
        let mut t = planner_with(assets, MemorySink::new(), settings());
        t.planner.configure(RoomConfig::default()).unwrap();
        t.planner.add_catalog_item(&catalog_item("chair-1", "Chair", 149.0));
        t.planner.tick(STEP);

        let centre = t.planner.screen_point(Vec3::new(0.0, -1.2, 0.0));
        click(&mut t.planner, centre);
        assert!(t.planner.scene().selection().is_some());

        assert!(t.planner.delete_selected());
        assert!(t.planner.scene().selection().is_none());
        assert!(!t.planner.set_selected_rotation(45.0));
        assert!(!t.planner.delete_selected());

        let blob: serde_json::Value = serde_json::from_str(&t.planner.serialize().unwrap()).unwrap();
        assert_eq!(blob["objects"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_load_finishing_after_clear_is_discarded() {
        let assets = Rc::new(GatedAssetSource::default().with("/models/sofa-1/model.glb", glb_box(SOFA_HALF)));
        let mut t = planner_with(assets.clone(), MemorySink::new(), settings());
        t.planner.configure(RoomConfig::default()).unwrap();
        t.planner.add_catalog_item(&catalog_item("sofa-1", "Sofa", 899.99));
        t.planner.tick(STEP);
        assert_eq!(assets.pending(), 1);
        assert_eq!(t.planner.pending_loads(), 1);

        t.planner.clear();
        t.planner.configure(RoomConfig::default()).unwrap();
        assets.release_all();
        t.planner.tick(STEP);

        assert!(t.planner.scene().nodes().is_empty());
        assert_eq!(t.planner.pending_loads(), 0);
    }

    #[test]
    fn test_gated_load_lands_when_released() {
        let assets = Rc::new(GatedAssetSource::default().with("/models/sofa-1/model.glb", glb_box(SOFA_HALF)));
        let mut t = planner_with(assets.clone(), MemorySink::new(), settings());
        t.planner.configure(RoomConfig::default()).unwrap();
        t.planner.add_catalog_item(&catalog_item("sofa-1", "Sofa", 899.99));

        // Frames keep running while the load is pending
        run(&mut t.planner, 1.0);
        assert!(t.planner.scene().nodes().is_empty());
        assert!(t.planner.is_running());

        assets.release_all();
        t.planner.tick(STEP);
        assert_eq!(t.planner.scene().nodes().len(), 1);
    }

    #[test]
    fn test_gpu_handles_released_exactly_once() {
        let assets = glb_assets(&[("sofa-1", SOFA_HALF), ("chair-1", CHAIR_HALF)]);
        let mut t = planner_with(assets, MemorySink::new(), settings());
        t.planner.configure(RoomConfig::default()).unwrap();
        t.planner.add_catalog_item(&catalog_item("sofa-1", "Sofa", 899.99));
        t.planner.add_catalog_item(&catalog_item("chair-1", "Chair", 149.0));
        t.planner.tick(STEP);

        let tracker = t.planner.scene().tracker().clone();
        assert_eq!(tracker.live_count(), 4);

        // Selecting and deselecting never touches GPU handles
        let centre = t.planner.screen_point(Vec3::new(0.0, -1.2, 0.0));
        click(&mut t.planner, centre);
        click(&mut t.planner, Vec2::new(1.0, 1.0));
        assert!(t.planner.scene().selection().is_none());
        assert_eq!(tracker.released_count(), 0);

        click(&mut t.planner, centre);
        assert!(t.planner.delete_selected());
        assert_eq!(tracker.released_count(), 1);

        t.planner.configure(RoomConfig::square(4.0, 2.5)).unwrap();
        assert_eq!(tracker.released_count(), 4);
        assert_eq!(tracker.live_count(), 2);

        t.planner.clear();
        assert_eq!(tracker.live_count(), 0);
        assert_eq!(tracker.released_count(), tracker.allocated_count());
    }

    #[test]
    fn test_square_room_has_equal_sides() {
        let mut t = planner_with(glb_assets(&[]), MemorySink::new(), settings());
        let mut config = RoomConfig::square(4.5, 2.7);
        config.depth = 9.0;
        t.planner.configure(config).unwrap();
        let config = t.planner.scene().config().unwrap();
        assert_eq!(config.width, config.depth);
    }
}
