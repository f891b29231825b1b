use city_metrics::services::color_scale::Color;
use city_metrics::services::{build_scale, compute_stats, parse_kml};
use criterion::{criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use std::fs;
use std::hint::black_box;

/// A city-sized grid in the generator's KML layout.
fn synthetic_grid(rows: usize, cols: usize) -> String {
    let mut kml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<kml><Document>\n");
    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = (-97.8 + col as f64 * 0.01, 30.2 + row as f64 * 0.01);
            let households = (row * 37 + col * 101) % 5000;
            write!(
                kml,
                "<Placemark><n>Block {row}-{col}</n>\
                 <data name=\"Households\">{households}</data>\
                 <data name=\"Median_HH_Income\">{}</data>\
                 <Polygon><outerBoundaryIs><LinearRing><coordinates>\
                 {x},{y},0 {},{y},0 {},{},0 {x},{},0 {x},{y},0\
                 </coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark>\n",
                40000 + households * 40,
                x + 0.01,
                x + 0.01,
                y + 0.01,
                y + 0.01,
            )
            .expect("Writing to a String cannot fail");
        }
    }
    kml.push_str("</Document></kml>\n");
    kml
}

fn benchmark_choropleth(c: &mut Criterion) {
    let grid = synthetic_grid(60, 60);
    let sample = fs::read_to_string("data/KMLs/Austin_Metric_Validation_Metric_Validation.kml")
        .expect("Failed to read sample region");

    let palette: Vec<Color> = [
        "rgba(0, 0, 255, 0.5)",
        "rgba(0, 255, 0, 0.5)",
        "rgba(255, 255, 0, 0.5)",
        "rgba(255, 0, 0, 0.5)",
    ]
    .iter()
    .map(|s| s.parse().expect("Valid color"))
    .collect();

    let collection = parse_kml(&grid).expect("Failed to parse grid");

    let mut group = c.benchmark_group("choropleth");

    group.bench_function("parse_sample_region", |b| {
        b.iter(|| parse_kml(black_box(&sample)))
    });

    group.bench_function("parse_3600_placemarks", |b| {
        b.iter(|| parse_kml(black_box(&grid)))
    });

    group.bench_function("stats_and_scale", |b| {
        b.iter(|| {
            let stats = compute_stats(black_box(&collection), "Households").expect("Has data");
            build_scale(stats.min, stats.max, &palette).map(|s| s.fill_color_rule("Households"))
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_choropleth);
criterion_main!(benches);
