//! Property-based tests for cadbridge
//!
//! These tests use proptest to generate arcs, path commands and sketches and
//! verify that conversions between representations hold across a wide range
//! of inputs.

use cadbridge::arc::CenterArc;
use cadbridge::geometry::LineSegment;
use cadbridge::kernel::{CoordinateSystem, FRAC_PI_2, PI, Point2, TAU, positive_angle};
use cadbridge::path::{ArcTo, PathCommand, generate_path, parse_path};
use cadbridge::{FcstdBridge, FormatBridge, PartFile, Sketch, SvgBridge, Tolerance};
use approx::relative_eq;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

/// Generate a point in a drawing-sized area
fn point_strategy() -> impl Strategy<Value = Point2> {
    (-100.0f64..100.0, -100.0f64..100.0).prop_map(|(x, y)| Point2::new(x, y))
}

/// Generate a sweep that stays clear of zero, half and full turns
fn sweep_strategy() -> impl Strategy<Value = f64> {
    let small = 0.05..(PI - 0.05);
    let large = (PI + 0.05)..(TAU - 0.05);
    (prop_oneof![small, large], any::<bool>()).prop_map(|(magnitude, negative)| {
        if negative { -magnitude } else { magnitude }
    })
}

/// Generate a non-degenerate center-form arc, circular or elliptical
fn center_arc_strategy() -> impl Strategy<Value = CenterArc> {
    (
        point_strategy(),
        0.5f64..50.0,
        0.5f64..50.0,
        0.0f64..PI,
        0.0f64..TAU,
        sweep_strategy(),
    )
        .prop_map(|(center, rx, ry, rotation, start, sweep)| CenterArc {
            center,
            rx,
            ry,
            rotation,
            start,
            sweep,
        })
}

/// Generate one drawing command following a moveto
fn command_strategy() -> impl Strategy<Value = PathCommand> {
    prop_oneof![
        point_strategy().prop_map(PathCommand::LineTo),
        (
            0.001f64..1e4,
            0.001f64..1e4,
            -360.0f64..360.0,
            any::<bool>(),
            any::<bool>(),
            point_strategy()
        )
            .prop_map(|(rx, ry, rotation, large_arc, sweep, end)| {
                PathCommand::ArcTo(ArcTo {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    end,
                })
            }),
    ]
}

/// Generate a canonical command list of one or more subpaths
fn path_strategy() -> impl Strategy<Value = Vec<PathCommand>> {
    let subpath = (point_strategy(), prop::collection::vec(command_strategy(), 0..8), any::<bool>()).prop_map(
        |(start, body, close)| {
            let mut commands = vec![PathCommand::MoveTo(start)];
            commands.extend(body);
            if close {
                commands.push(PathCommand::ClosePath);
            }
            commands
        },
    );
    prop::collection::vec(subpath, 1..4).prop_map(|subpaths| subpaths.concat())
}

/// Whether two center-form arcs share radii, rotation and start angle
///
/// An ellipse rotated by a half turn is the same ellipse with its parametric
/// angle shifted by a half turn; rotating a quarter turn instead swaps the
/// axes and shifts the parameter back a quarter turn.
fn same_parameters(a: &CenterArc, b: &CenterArc) -> bool {
    let tol = Tolerance::new(1e-7, 1e-7);
    let radii = |rx: f64, ry: f64| relative_eq!(rx, b.rx, epsilon = 1e-7) && relative_eq!(ry, b.ry, epsilon = 1e-7);
    let shifted = |rotation: f64, start: f64| {
        [0.0, PI].iter().any(|&k| {
            tol.angles_close(a.rotation + rotation + k, b.rotation) && tol.angles_close(a.start + start - k, b.start)
        })
    };
    (radii(a.rx, a.ry) && shifted(0.0, 0.0)) || (radii(a.ry, a.rx) && shifted(FRAC_PI_2, -FRAC_PI_2))
}

/// Generate a chain of connected line segments
fn polyline_strategy() -> impl Strategy<Value = Vec<Point2>> {
    prop::collection::vec(point_strategy(), 2..10).prop_filter("consecutive points must differ", |points| {
        points.windows(2).all(|w| (w[1] - w[0]).norm() > 1e-3)
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Center form survives a trip through endpoint form
    #[test]
    fn prop_center_endpoint_round_trip(arc in center_arc_strategy()) {
        let tol = Tolerance::new(1e-7, 1e-7);
        let endpoint = arc.to_endpoint_form().unwrap();
        let fit = endpoint.fit(&tol).unwrap();
        prop_assert!(!fit.radii_adjusted());

        let back = fit.arc;
        prop_assert!(tol.points_close(&back.center, &arc.center));
        prop_assert!(tol.is_close(back.sweep, arc.sweep));
        prop_assert!(same_parameters(&back, &arc), "{:?} came back as {:?}", arc, back);
        prop_assert!(tol.points_close(&back.start_point(), &arc.start_point()));
        prop_assert!(tol.points_close(&back.end_point(), &arc.end_point()));
    }

    /// Endpoint form survives a trip through center form
    #[test]
    fn prop_endpoint_center_round_trip(arc in center_arc_strategy()) {
        let tol = Tolerance::new(1e-7, 1e-7);
        let endpoint = arc.to_endpoint_form().unwrap();
        let again = endpoint.to_center_form(&tol).unwrap().to_endpoint_form().unwrap();
        prop_assert!(tol.points_close(&again.start, &endpoint.start));
        prop_assert!(tol.points_close(&again.end, &endpoint.end));
        prop_assert_eq!(again.large_arc, endpoint.large_arc);
        prop_assert_eq!(again.sweep_positive, endpoint.sweep_positive);
    }

    /// Generated path text parses back to the same commands
    #[test]
    fn prop_generate_is_parse_fixed_point(commands in path_strategy()) {
        let text = generate_path(&commands);
        let parsed = parse_path(&text).unwrap();
        prop_assert_eq!(&parsed, &commands);
        prop_assert_eq!(generate_path(&parsed), text);
    }

    /// The path parser never panics on arbitrary text
    #[test]
    fn prop_parser_does_not_panic(text in "[MmLlHhVvAaZz0-9 ,.eE+-]{0,64}") {
        let _ = parse_path(&text);
    }

    /// Normalized angles land in [0, 2π)
    #[test]
    fn prop_positive_angle_range(angle in -1e6f64..1e6) {
        let normalized = positive_angle(angle);
        prop_assert!((0.0..TAU).contains(&normalized));
    }

    /// Polylines keep their vertices through both bridges
    #[test]
    fn prop_polyline_through_bridges(points in polyline_strategy()) {
        let mut sketch = Sketch::new("Polyline", CoordinateSystem::world());
        for pair in points.windows(2) {
            sketch.add_geometry(LineSegment::new(pair[0], pair[1]).unwrap());
        }
        let mut part = PartFile::new("Polyline");
        part.body.add_feature(sketch).unwrap();

        let tol = Tolerance::default();
        let bridges: [&dyn FormatBridge; 2] = [&SvgBridge::default(), &FcstdBridge::default()];
        for bridge in bridges {
            let exported = bridge.export(&part).unwrap();
            let imported = bridge.import(&exported.output).unwrap().output;
            let read = &imported.body.sketches().next().unwrap().sketch;
            prop_assert_eq!(read.geometry_count(), points.len() - 1);
            for (geometry, pair) in read.iter_geometry().zip(points.windows(2)) {
                prop_assert!(tol.points_close(&geometry.shape.start_point().unwrap(), &pair[0]));
                prop_assert!(tol.points_close(&geometry.shape.end_point().unwrap(), &pair[1]));
            }
        }
    }
}
