pub mod computing;
pub mod partition;
pub mod geometry;
pub mod svg;
pub mod shape;
pub mod smoothed;
pub mod radial;
pub mod rendering;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use {
    computing::Bezier,
    computing::Couple,
    computing::Curve,
    partition::Polygon,
    partition::triangulate_ec,
    geometry::PrimitiveGeometry,
    svg::parse_svg,
    shape::Renderable,
    shape::SvgPrimitive,
    smoothed::Smoothed,
    radial::RadialMenu,
    radial::RadialMenuItem,
};
