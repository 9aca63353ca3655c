use gcoderip_core::{LinearUnit, ProgramUnits, Segment};
use gcoderip_generator::{generate, GenConfig};
use gcoderip_parser::{parse, ParseOptions};
use proptest::prelude::*;

fn units() -> ProgramUnits {
    ProgramUnits::new(LinearUnit::Inch)
}

fn waypoints(segments: &[Segment]) -> Vec<(f64, f64, f64)> {
    segments
        .iter()
        .filter_map(|s| s.end())
        .map(|p| {
            (
                p.x.unwrap_or(f64::NAN),
                p.y.unwrap_or(f64::NAN),
                p.z.unwrap_or(f64::NAN),
            )
        })
        .collect()
}

fn same(a: f64, b: f64, accuracy: f64) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() <= accuracy
}

#[test]
fn test_parse_then_generate() {
    let output = parse(
        "G0 X0 Y0\nG1 X10 Y0 F100\nM2",
        units().with_arc_angle_step(5.0),
        &ParseOptions::default(),
        None,
    )
    .unwrap();
    let lines = generate(&output.segments, &GenConfig::default());
    assert_eq!(lines, vec!["G0 X0 Y0", "G1 X10. F100.", "M2"]);
}

#[test]
fn test_arcs_survive_round_trip() {
    let text = "G0 X0 Y0 Z0\nG1 Z-0.1 F5\nG2 X2 Y0 I1 J0 F20\nG3 X4 Y0 R1\nG0 Z0.5\nM2";
    let first = parse(text, units(), &ParseOptions::default(), None).unwrap();
    let lines = generate(&first.segments, &GenConfig::default());
    let second = parse(&lines.join("\n"), units(), &ParseOptions::default(), None).unwrap();
    assert_eq!(first.segments, second.segments);
}

proptest! {
    #[test]
    fn waypoints_round_trip(moves in proptest::collection::vec(
        (any::<bool>(), -500i32..500, -500i32..500, -50i32..50),
        1..30,
    )) {
        let mut text = String::from("G0 X0 Y0 Z0\n");
        for (rapid, x, y, z) in &moves {
            let code = if *rapid { "G0" } else { "G1" };
            text.push_str(&format!(
                "{} X{} Y{} Z{} F25\n",
                code,
                *x as f64 / 100.0,
                *y as f64 / 100.0,
                *z as f64 / 100.0
            ));
        }
        let first = parse(&text, units(), &ParseOptions::default(), None).unwrap();
        let cfg = GenConfig::default();
        let lines = generate(&first.segments, &cfg);
        let second = parse(&lines.join("\n"), units(), &ParseOptions::default(), None).unwrap();

        let (a, b) = (waypoints(&first.segments), waypoints(&second.segments));
        // repeated points collapse to nothing on output
        let close = |p: &mut (f64, f64, f64), q: &mut (f64, f64, f64)| {
            same(p.0, q.0, cfg.accuracy) && same(p.1, q.1, cfg.accuracy) && same(p.2, q.2, cfg.accuracy)
        };
        let mut a_dedup = a;
        a_dedup.dedup_by(close);
        let mut b_dedup = b;
        b_dedup.dedup_by(close);
        prop_assert_eq!(a_dedup.len(), b_dedup.len());
        for (p, q) in a_dedup.iter().zip(&b_dedup) {
            prop_assert!(same(p.0, q.0, cfg.accuracy));
            prop_assert!(same(p.1, q.1, cfg.accuracy));
            prop_assert!(same(p.2, q.2, cfg.accuracy));
        }
    }
}
