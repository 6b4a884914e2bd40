use crate::computing::{flatten, signed_area, Bezier, Couple, Curve, Float, MAX_SUBDIVISION_DEPTH};
use crate::geometry::UNIT_Z;
use crate::partition::{triangulate_ec, Orientation, Polygon};
use crate::radial::{MenuConfig, MenuError, RadialMenu};
use crate::rendering::{rasterize, Viewport};
use crate::shape::{DrawMode, Renderable, SvgPrimitive};
use crate::svg::{parse_svg, PackedColor, Paint, SvgError};

use rgb::RGBA8;

use core::f32::consts::FRAC_PI_2;
use std::cell::Cell;
use std::rc::Rc;

fn distance_to_segment(p: Couple, a: Couple, b: Couple) -> Float {
    let ab = b - a;
    let len2 = ab.dot(ab);
    let t = match len2 > 0.0 {
        true => ((p - a).dot(ab) / len2).clamp(0.0, 1.0),
        false => 0.0,
    };
    (p - (a + ab * t)).magnitude()
}

fn square(x: Float, y: Float, s: Float) -> Vec<Couple> {
    vec![
        Couple::new(x, y),
        Couple::new(x + s, y),
        Couple::new(x + s, y + s),
        Couple::new(x, y + s),
    ]
}

fn menu_with(items: usize) -> RadialMenu {
    let mut menu = RadialMenu::new(MenuConfig {
        radius: 1.0,
        thickness: 0.5,
        activated_radius: 2.0,
        ..MenuConfig::default()
    });
    menu.set_num_items(items);
    menu
}

#[test]
fn flattened_curve_stays_within_tolerance() {
    let tolerance = 0.5;
    let bezier = Bezier::new(
        Couple::new(0.0, 0.0),
        Couple::new(0.0, 100.0),
        Couple::new(100.0, 100.0),
        Couple::new(100.0, 0.0),
    );
    let mut curve = Curve::new(tolerance);
    curve.append(&bezier);
    let points = curve.points();
    assert!(points.len() > 2);
    assert_eq!(points[0], bezier.b[0]);
    assert_eq!(*points.last().unwrap(), bezier.b[3]);

    for i in 0..=1000 {
        let p = bezier.eval(i as Float / 1000.0);
        let nearest = points
            .windows(2)
            .map(|s| distance_to_segment(p, s[0], s[1]))
            .fold(Float::INFINITY, Float::min);
        assert!(nearest <= tolerance + 1e-3, "deviation {} at sample {}", nearest, i);
    }
}

#[test]
fn straight_curve_flattens_to_its_endpoints() {
    let start = Couple::new(0.0, 0.0);
    let end = Couple::new(9.0, 3.0);
    let mut curve = Curve::default();
    curve.append(&Bezier::line(start, end));
    assert_eq!(curve.points(), &[start, end]);
}

#[test]
fn closing_point_is_not_repeated() {
    let origin = Couple::new(0.0, 0.0);
    let loop_back = Bezier::new(origin, Couple::new(10.0, 0.0), Couple::new(10.0, 10.0), origin);
    let mut curve = Curve::new(0.25);
    curve.append(&loop_back);
    let points = curve.points();
    assert!(points.len() > 3);
    assert!(points[1..].iter().all(|p| *p != origin));
}

#[test]
fn zero_tolerance_still_terminates() {
    let bezier = Bezier::new(
        Couple::new(0.0, 0.0),
        Couple::new(50.0, 100.0),
        Couple::new(-50.0, 100.0),
        Couple::new(1.0, 0.0),
    );
    let mut curve = Curve::new(0.0);
    curve.append(&bezier);
    assert!(curve.points().len() <= (1 << MAX_SUBDIVISION_DEPTH) + 1);
    assert_eq!(*curve.points().last().unwrap(), bezier.b[3]);
}

#[test]
fn chained_segments_flatten_in_order() {
    let points = [
        Couple::new(0.0, 0.0),
        Couple::new(1.0, 0.0),
        Couple::new(2.0, 0.0),
        Couple::new(3.0, 0.0),
        Couple::new(3.0, 1.0),
        Couple::new(3.0, 2.0),
        Couple::new(3.0, 3.0),
    ];
    let curve = flatten(&points, 1.0);
    assert_eq!(curve.points(), &[points[0], points[3], points[6]]);
}

#[test]
fn holes_are_subtracted_from_the_area() {
    let outer = Polygon::new(square(0.0, 0.0, 10.0));
    let mut small = Polygon::new(square(2.0, 2.0, 2.0));
    small.set_hole(true);
    small.set_orientation(Orientation::Clockwise);
    let mut large = Polygon::new(square(5.0, 5.0, 3.0));
    large.set_hole(true);
    large.set_orientation(Orientation::Clockwise);

    let triangles = triangulate_ec(&[small, large, outer]).unwrap();
    let total: Float = triangles.iter().map(|t| signed_area(t)).sum();
    assert!((total - (100.0 - 4.0 - 9.0)).abs() < 1e-3, "area {}", total);
    assert!(triangles.iter().all(|t| signed_area(t) >= 0.0));
}

#[test]
fn holes_go_to_the_outer_contour_around_them() {
    let left = Polygon::new(square(0.0, 0.0, 10.0));
    let right = Polygon::new(square(20.0, 0.0, 10.0));
    let mut hole = Polygon::new(square(22.0, 2.0, 2.0));
    hole.set_hole(true);

    let triangles = triangulate_ec(&[left, hole, right]).unwrap();
    let total: Float = triangles.iter().map(|t| signed_area(t)).sum();
    assert!((total - (200.0 - 4.0)).abs() < 1e-3, "area {}", total);
    // nothing was cut out of the left square
    let left_area: Float = triangles
        .iter()
        .filter(|t| t.iter().all(|p| p.x <= 10.0))
        .map(|t| signed_area(t))
        .sum();
    assert!((left_area - 100.0).abs() < 1e-3);
}

#[test]
fn clockwise_outer_is_reoriented() {
    let mut points = square(0.0, 0.0, 4.0);
    points.reverse();
    let triangles = triangulate_ec(&[Polygon::new(points)]).unwrap();
    assert_eq!(triangles.len(), 2);
    let total: Float = triangles.iter().map(|t| signed_area(t)).sum();
    assert!((total - 16.0).abs() < 1e-4);
}

#[test]
fn groups_pass_paint_and_transform_down() {
    let image = parse_svg(
        r#"<svg width="10" height="10"><g fill="red" transform="translate(5 0)">
            <rect x="0" y="0" width="2" height="2"/></g></svg>"#,
    )
    .unwrap();
    assert_eq!((image.width, image.height), (10.0, 10.0));
    assert_eq!(image.shapes.len(), 1);
    let shape = &image.shapes[0];
    assert_eq!(shape.fill, Paint::Color(PackedColor(0xFF00_00FF)));
    assert_eq!(shape.stroke, Paint::None);
    assert_eq!(shape.paths[0].points[0], Couple::new(5.0, 0.0));
    assert!(shape.paths[0].closed);
}

#[test]
fn view_box_scales_to_the_viewport() {
    let image = parse_svg(r#"<svg width="20" height="20" viewBox="0 0 10 10"><rect width="10" height="10"/></svg>"#)
        .unwrap();
    let max_x = image.shapes[0].paths[0].points.iter().map(|p| p.x).fold(0.0, Float::max);
    assert!((max_x - 20.0).abs() < 1e-4);
}

#[test]
fn inline_style_overrides_attributes() {
    let image = parse_svg(
        r#"<svg><circle cx="0" cy="0" r="10" fill="blue" style="fill:none; stroke:#00ff00; stroke-width:2"/></svg>"#,
    )
    .unwrap();
    let shape = &image.shapes[0];
    assert_eq!(shape.fill, Paint::None);
    assert_eq!(shape.stroke, Paint::Color(PackedColor(0xFF00_FF00)));
    assert_eq!(shape.stroke_width, 2.0);
    assert_eq!(shape.paths[0].points.len(), 13);
}

#[test]
fn definitions_are_not_drawn() {
    let image = parse_svg(r#"<svg><defs><rect width="1" height="1"/></defs><path d="M0 0 L1 0 L0 1 Z"/></svg>"#)
        .unwrap();
    assert_eq!(image.shapes.len(), 1);
}

#[test]
fn path_data_error_keeps_the_valid_prefix() {
    let image = parse_svg(r#"<svg><path d="M0 0 L10 0 L10 10 Z L foo"/></svg>"#).unwrap();
    assert_eq!(image.shapes[0].paths.len(), 1);
}

#[test]
fn malformed_documents_are_rejected() {
    assert_eq!(parse_svg("<svg><rect></svg>"), Err(SvgError::Xml));
    assert_eq!(parse_svg("<html/>"), Err(SvgError::NoRoot));
}

const TWO_RECTS: &str = r#"<svg width="32" height="32">
    <rect x="0" y="0" width="8" height="8" fill="red"/>
    <rect x="10" y="10" width="8" height="8" fill="blue" stroke="black" stroke-width="2"/>
</svg>"#;

#[test]
fn fill_comes_before_stroke() {
    let mut svg = SvgPrimitive::new(TWO_RECTS);
    assert!(svg.needs_rebuild());
    assert!(svg.update());
    assert!(!svg.update());

    let children = svg.children();
    assert_eq!(children.len(), 3);
    assert!(children[0].is_fill());
    assert!(children[1].is_fill());
    assert_eq!(children[2].draw_mode(), DrawMode::LineLoop);

    let fill = children[0].shape();
    assert!(fill.geometry().vertices().iter().all(|v| v.position.z == 0.0 && v.normal == UNIT_Z));
    let mesh = fill.mesh().unwrap();
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 6);
}

#[test]
fn reparsing_discards_old_children() {
    let mut svg = SvgPrimitive::new(TWO_RECTS);
    svg.update();
    assert_eq!(svg.children().len(), 3);

    svg.set(r#"<svg><circle cx="5" cy="5" r="4" fill="none" stroke="blue" stroke-width="2"/></svg>"#)
        .unwrap();
    assert!(svg.children().is_empty());
    svg.update();
    assert_eq!(svg.children().len(), 1);
    assert!(matches!(svg.children()[0], Renderable::Stroke(_)));
}

#[test]
fn invisible_shape_has_no_children() {
    let mut svg = SvgPrimitive::new(
        r#"<svg><rect width="4" height="4" fill="red" fill-opacity="0" stroke="blue" stroke-width="0"/></svg>"#,
    );
    svg.update();
    assert!(svg.children().is_empty());

    svg.set(r#"<svg><rect width="4" height="4" fill="red" opacity="0"/></svg>"#).unwrap();
    svg.update();
    assert!(svg.children().is_empty());
}

#[test]
fn thin_strokes_fade() {
    let mut svg = SvgPrimitive::new(r#"<svg><rect width="4" height="4" fill="none" stroke="red" stroke-width="0.5"/></svg>"#);
    svg.update();
    assert_eq!(svg.children().len(), 1);
    assert!((svg.children()[0].color().a - 0.5).abs() < 1e-3);
}

#[test]
fn failed_triangulation_skips_one_shape() {
    // the hole lies outside of the outer contour
    let mut svg = SvgPrimitive::new(
        r#"<svg>
            <path d="M20 20 L22 20 L22 22 Z M0 0 L10 0 L10 10 L0 10 Z" fill="red"/>
            <rect width="4" height="4" fill="green"/>
        </svg>"#,
    );
    svg.update();
    assert_eq!(svg.children().len(), 1);
    assert!(svg.children()[0].is_fill());
}

#[test]
fn bad_document_leaves_nothing_to_draw() {
    let mut svg = SvgPrimitive::new(TWO_RECTS);
    svg.update();
    assert_eq!(svg.set("<svg><g></svg>"), Err(SvgError::Xml));
    assert!(svg.image().is_none());
    assert!(!svg.update());
    assert!(svg.children().is_empty());
}

#[test]
fn open_lines_only_stroke() {
    let mut svg = SvgPrimitive::new(r#"<svg><line x1="0" y1="0" x2="5" y2="5" stroke="black"/></svg>"#);
    svg.update();
    assert_eq!(svg.children().len(), 1);
    assert_eq!(svg.children()[0].draw_mode(), DrawMode::LineStrip);
}

#[test]
fn preview_paints_the_fill() {
    let mut svg = SvgPrimitive::new(
        r#"<svg width="16" height="16"><rect x="4" y="4" width="8" height="8" fill="red" stroke="blue"/></svg>"#,
    );
    svg.update();
    let (w, h) = (16, 16);
    let mut canvas = vec![RGBA8::new(7, 7, 7, 7); w * h];
    let mut mask = vec![0; w * h];
    rasterize::<4>(svg.children(), Viewport::default(), &mut canvas, &mut mask, w, h, w, true);
    assert_eq!(canvas[8 * w + 8], RGBA8::new(255, 0, 0, 255));
    assert_eq!(canvas[w + 1], RGBA8::new(0, 0, 0, 0));
}

#[test]
fn point_at_zero_degrees_hits_first_slot() {
    let menu = menu_with(8);
    let hit = menu.item_from_point(Couple::new(1.5, 0.0)).unwrap();
    assert_eq!(hit.index, 0);
    assert!((hit.ratio - 0.5).abs() < 1e-5);

    let hit = menu.item_from_point(Couple::new(0.0, 1.25)).unwrap();
    assert_eq!(hit.index, 2);
    assert!((hit.ratio - 0.25).abs() < 1e-5);
}

#[test]
fn slot_boundaries_always_hit() {
    for n in 1..=12 {
        let menu = menu_with(n);
        let w = menu.slot_width();
        for k in 0..n {
            let boundary = w * k as Float + w * 0.5;
            let hit = menu.item_from_point(crate::computing::cartesian(boundary, 1.5));
            let hit = hit.unwrap_or_else(|| panic!("{} items, boundary {} missed", n, k));
            assert!(hit.index == k || hit.index == (k + 1) % n);
            assert!((hit.ratio - 0.5).abs() < 1e-4);
        }
    }
}

#[test]
fn item_hit_tolerates_its_own_edges() {
    let menu = menu_with(9);
    let item = menu.item(6).unwrap();
    let edge = crate::computing::cartesian(item.sector().start_angle, 1.5);
    assert!(item.hit(edge).is_some());
    assert!(item.hit(crate::computing::cartesian(item.sector().mid_angle() + 1.0, 1.5)).is_none());
}

#[test]
fn points_off_the_ring_miss() {
    let menu = menu_with(8);
    assert!(menu.item_from_point(Couple::new(0.5, 0.0)).is_none());
    assert!(menu.item_from_point(Couple::new(2.5, 0.0)).is_none());
    assert!(menu_with(0).item_from_point(Couple::new(1.5, 0.0)).is_none());
}

#[test]
fn hit_test_follows_the_center() {
    let mut menu = menu_with(4);
    let config = *menu.config();
    menu.set_config(MenuConfig {
        center: Couple::new(10.0, 10.0),
        ..config
    });
    let hit = menu.item_from_point(Couple::new(10.0, 8.5)).unwrap();
    assert_eq!(hit.index, 3);
}

#[test]
fn slots_partition_the_circle() {
    let menu = menu_with(6);
    let width: Float = menu.items().map(|item| item.sector().angular_width()).sum();
    assert!((width - core::f32::consts::TAU).abs() < 1e-4);
    assert!((menu.item(0).unwrap().sector().mid_angle()).abs() < 1e-6);
    assert!((menu.item(1).unwrap().sector().mid_angle() - core::f32::consts::TAU / 6.0).abs() < 1e-5);
}

#[test]
fn activation_converges_without_overshoot() {
    let mut menu = menu_with(8);
    let cursor = Couple::new(1.5, 0.0);
    for _ in 0..300 {
        let result = menu.update_items_from_cursor(cursor, 1.0 / 60.0);
        assert_eq!(result.committed, None);
        for item in menu.items() {
            let a = item.current_activation();
            assert!((0.0..=1.0).contains(&a));
        }
    }
    assert!((menu.item(0).unwrap().current_activation() - 0.5).abs() < 1e-3);
    assert!(menu.items().skip(1).all(|item| item.current_activation() < 1e-6));
}

#[test]
fn commit_fires_once_per_gesture() {
    let mut menu = menu_with(4);
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    menu.item_mut(1).unwrap().set_callback(move || counter.set(counter.get() + 1));

    let on_item = Couple::new(0.0, 2.0);
    let mut commits = Vec::new();
    for _ in 0..120 {
        let result = menu.update_items_from_cursor(on_item, 1.0 / 60.0);
        if let Some(i) = result.committed {
            assert!(result.activation >= 0.95);
            commits.push(i);
        }
    }
    assert_eq!(commits, vec![1]);
    assert_eq!(fired.get(), 1);
    assert!(menu.item(1).unwrap().is_cooling_down());

    for _ in 0..120 {
        menu.update_items_from_cursor(Couple::zero(), 1.0 / 60.0);
    }
    assert!(!menu.item(1).unwrap().is_cooling_down());

    for _ in 0..120 {
        menu.update_items_from_cursor(on_item, 1.0 / 60.0);
    }
    assert_eq!(fired.get(), 2);
}

#[test]
fn wedge_edges_fade_activation() {
    let mut menu = menu_with(4);
    // exactly between slots 0 and 1
    let cursor = crate::computing::cartesian(FRAC_PI_2 * 0.5, 2.0);
    for _ in 0..120 {
        assert_eq!(menu.update_items_from_cursor(cursor, 1.0 / 60.0).committed, None);
    }
    assert!(menu.items().all(|item| item.current_activation() < 0.01));
}

#[test]
fn out_of_range_items_are_reported() {
    let mut menu = menu_with(8);
    assert_eq!(menu.item(8).unwrap_err(), MenuError::OutOfRange { index: 8, len: 8 });
    assert!(menu.item_mut(7).is_ok());
    menu.set_num_items(3);
    assert_eq!(menu.num_items(), 3);
    assert!(menu.item(3).is_err());
}

#[test]
fn menu_geometry_grows_with_activation() {
    let mut menu = menu_with(3);
    let before = menu.geometry(8);
    assert_eq!(before.len(), 6);
    assert!(before[0].is_fill() && !before[1].is_fill());
    assert_eq!(before[0].triangle_count(), 16);

    for _ in 0..60 {
        menu.update_items_from_cursor(Couple::new(1.75, 0.0), 1.0 / 60.0);
    }
    let item = menu.item(0).unwrap();
    assert!(item.current_radius() > item.sector().outer_radius());

    menu.item_mut(2).unwrap().set_icon(SvgPrimitive::new(TWO_RECTS));
    assert_eq!(menu.geometry(8).len(), 6 + 3);
}

#[test]
fn unparsable_source_builds_an_empty_primitive() {
    let mut svg = SvgPrimitive::new("<svg><path></svg>");
    assert!(svg.image().is_none());
    assert!(!svg.needs_rebuild());
    assert!(!svg.update());
    assert_eq!(svg.size(), Couple::zero());
}
