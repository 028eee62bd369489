use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use room_planner::catalog::{CatalogProvider, CatalogView, MemoryCart, StaticCatalog};
use room_planner::cli::{Cli, Command, NewRoom};
use room_planner::core::{Accumulator, Clock};
use room_planner::loaders::FsAssetSource;
use room_planner::math::display_degrees;
use room_planner::persistence::FileSink;
use room_planner::planner::{PlannerCollaborators, PlannerContext, RoomPlanner};
use room_planner::render::HeadlessRenderer;
use room_planner::settings::PlannerSettings;

// === Constants ===

const FRAME_HZ: f32 = 60.0;
const MAX_STEPS_PER_FRAME: u8 = 4;
/// Give up waiting on loads and saves after this much simulated time
const SETTLE_TIMEOUT_SECONDS: f32 = 30.0;

/// Pump frames until every load has landed and the debounced save has fired
fn drive(planner: &mut RoomPlanner, realtime: bool) {
    let mut accumulator = Accumulator::new(FRAME_HZ, MAX_STEPS_PER_FRAME);
    let mut clock = Clock::new();
    let mut simulated = 0.0;

    loop {
        let delta = if realtime {
            std::thread::sleep(Duration::from_secs_f32(1.0 / FRAME_HZ));
            clock.tick()
        } else {
            accumulator.timestep()
        };

        for step in accumulator.tick(delta) {
            planner.tick(step);
            simulated += step;
        }

        if planner.pending_loads() == 0 && !planner.is_save_pending() {
            break;
        }
        if simulated > SETTLE_TIMEOUT_SECONDS {
            log::warn!(
                "Stopped waiting after {:.0}s with {} loads pending",
                simulated,
                planner.pending_loads()
            );
            break;
        }
    }
    log::debug!("Settled after {:.2}s simulated ({:.2}s wall)", simulated, clock.elapsed());
}

fn print_summary(planner: &RoomPlanner) {
    let Some(config) = planner.scene().config() else {
        println!("No room configured");
        return;
    };
    println!(
        "Room {}x{}x{} m ({:?}), walls {}, floor {:?} {}",
        config.width,
        config.height,
        config.depth,
        config.shape,
        config.wall_color,
        config.floor_finish,
        config.floor_color
    );
    println!("{} fixtures, {} furniture items", planner.scene().fixtures().len(), planner.scene().nodes().len());
    for node in planner.scene().nodes() {
        let position = node.position();
        println!(
            "  {:<24} {:<26} ({:6.2}, {:6.2}, {:6.2}) {:>3}°  {:>9.2}",
            node.meta.display_name,
            node.meta.product_id,
            position.x,
            position.y,
            position.z,
            display_degrees(node.yaw()),
            node.meta.price
        );
    }
}

fn place_items(planner: &mut RoomPlanner, catalog: &CatalogView, args: &NewRoom) {
    for product_id in &args.place {
        match catalog.find(product_id) {
            Some(item) => {
                planner.add_catalog_item(item);
            }
            None => log::warn!("Product {} is not in the catalog", product_id),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => PlannerSettings::from_file(path)?,
        None => PlannerSettings::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => StaticCatalog::from_file(path)?,
        None => StaticCatalog::default(),
    };
    let catalog = CatalogView::new(catalog.list(&cli.shop));
    let cart = Rc::new(MemoryCart::new());

    let mut planner = RoomPlanner::new(
        PlannerContext::new(cli.user.clone(), cli.shop.clone()),
        settings,
        PlannerCollaborators {
            assets: Rc::new(FsAssetSource::new(&cli.assets)),
            sink: Rc::new(FileSink::new(&cli.store_dir)),
            cart: cart.clone(),
            renderer: Box::new(HeadlessRenderer::default()),
        },
    );

    match &cli.command {
        Command::New(args) => {
            planner
                .configure(args.room_config())
                .context("Invalid room configuration")?;
            place_items(&mut planner, &catalog, args);
            drive(&mut planner, cli.realtime);
            print_summary(&planner);
        }
        Command::Show => {
            if !planner.mount() {
                println!("No saved room for {}", cli.user);
                return Ok(());
            }
            drive(&mut planner, cli.realtime);
            print_summary(&planner);
        }
        Command::Cart => {
            if !planner.mount() {
                println!("No saved room for {}", cli.user);
                return Ok(());
            }
            drive(&mut planner, cli.realtime);
            planner.view_cart();
            for (line, quantity) in cart.lines() {
                println!("  {:>2} x {:<24} {:>9.2}", quantity, line.name, line.price);
            }
            println!("{} items, subtotal {:.2}", cart.item_count(), cart.subtotal());
            for event in planner.drain_events() {
                log::info!("{:?}", event);
            }
        }
        Command::Clear => {
            planner.clear();
            println!("Cleared saved room for {}", cli.user);
        }
    }

    Ok(())
}
