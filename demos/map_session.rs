//! Map Session Example
//!
//! Drives a headless map session through a few pan and zoom gestures over a
//! synthetic Warsaw shop catalog, printing the markers each frame would draw.
//!
//! Run with `RUST_LOG=debug cargo run --example map_session` to see the
//! tracker and index logs.

use shopmap::markers::MarkerKind;
use shopmap::{
    Bounds, Config, InMemorySource, ManualClock, MapSession, Marker, MarkerRenderer, Point,
    Product, SettleOutcome, ShopFilter, ShopPoint, ViewportEvent,
};
use std::error::Error;
use std::time::Duration;

/// Prints a one-line summary per rendered frame.
struct ConsoleRenderer {
    frame: usize,
}

impl MarkerRenderer for ConsoleRenderer {
    fn render(&mut self, markers: &[Marker<'_>]) {
        self.frame += 1;
        let clusters: Vec<String> = markers
            .iter()
            .filter_map(|m| match &m.kind {
                MarkerKind::Cluster { point_count, tier } => {
                    Some(format!("{}@{}px", point_count, tier.size_px))
                }
                MarkerKind::Shop { .. } => None,
            })
            .collect();
        let shops = markers.len() - clusters.len();
        println!(
            "   frame {:>2}: {} clusters [{}], {} shops",
            self.frame,
            clusters.len(),
            clusters.join(", "),
            shops
        );
    }
}

fn catalog() -> Vec<ShopPoint> {
    let chains = ["zabka", "biedronka", "lidl", "dino", "carrefour"];
    (0..400)
        .map(|i| {
            let chain = chains[i % chains.len()];
            let shop = ShopPoint::new(
                format!("{} #{}", chain, i),
                chain,
                "Warszawa",
                52.15 + (i % 20) as f64 * 0.009,
                20.90 + (i / 20) as f64 * 0.013,
            );
            if i % 7 == 0 {
                shop.with_products(vec![Product::new(7, "Tiger", "energy_drink")])
            } else {
                shop
            }
        })
        .collect()
}

fn settle(lon: f64, lat: f64, zoom: f64) -> ViewportEvent {
    let center = Point::new(lon, lat);
    let half = 180.0 / 2f64.powf(zoom);
    ViewportEvent::new(center, Bounds::around(center, half * 1.6, half), zoom)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("=== Store locator map session ===\n");

    let clock = ManualClock::new();
    let renderer = ConsoleRenderer { frame: 0 };
    let mut session = MapSession::with_clock(Config::default(), renderer, clock.clone());
    let mut source = InMemorySource::new(catalog());

    println!("1. Open the map over Warsaw at zoom 11");
    let outcome = session.viewport_settled(&settle(21.01, 52.23, 11.0));
    println!("   settle: {:?}", outcome);
    clock.advance(Duration::from_millis(500));
    println!("   fetch: {:?}\n", session.tick(&mut source)?);

    println!("2. A burst of small pans collapses into a single fetch");
    for step in 0..5 {
        let outcome = session.viewport_settled(&settle(21.02 + step as f64 * 0.01, 52.23, 12.0));
        if outcome != SettleOutcome::Scheduled {
            println!("   settle {}: {:?}", step, outcome);
        }
        clock.advance(Duration::from_millis(100));
        session.tick(&mut source)?;
    }
    clock.advance(Duration::from_millis(500));
    println!("   fetch: {:?}\n", session.tick(&mut source)?);

    println!("3. Click the biggest cluster");
    let biggest = session
        .visible_features()
        .into_iter()
        .filter(|f| f.is_cluster())
        .max_by_key(|f| f.point_count());
    if let Some(cluster) = biggest {
        let target = session.expand_cluster(cluster.cluster_id(), cluster.position());
        println!(
            "   cluster of {} expands at zoom {}",
            cluster.point_count(),
            target.zoom
        );
        session.viewport_settled(&settle(target.center.x(), target.center.y(), target.zoom as f64));
    }
    println!();

    println!("4. Show only shops with energy drinks");
    session.set_filter(ShopFilter::default().with_category("energy_drink"));
    let facets = session.facets();
    println!(
        "   chains available: {}",
        facets
            .chains
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    println!("\n5. Close the map");
    session.close();
    clock.advance(Duration::from_secs(1));
    println!("   fetch after close: {:?}", session.tick(&mut source)?);

    Ok(())
}
