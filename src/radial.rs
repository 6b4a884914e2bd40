//! Pie menus: wedge layout, hit testing and smoothed item activation.
//!
//! Angles are in radians, counterclockwise from +X with Y pointing up.
//! Slot `i` of an `n`-item menu is centered on `reference_angle + i * 2π / n`.

use crate::computing::{angular_distance, cartesian, normalize_angle, polar, Couple, Float, Triple};
use crate::geometry::{Color, PrimitiveGeometry, VertexAttributes};
use crate::shape::{DrawMode, GenericShape, Renderable, SvgPrimitive};
use crate::smoothed::{Smoothed, DEFAULT_RATE};

use rgb::RGBA;

use core::f32::consts::TAU;
use core::fmt;

/// Activation at which an item commits
pub const COMMIT_THRESHOLD: Float = 0.95;

/// Activation under which a committed item may commit again
pub const RESET_THRESHOLD: Float = 0.5;

/// Outer share of a wedge's half-width over which activation fades out
pub const EDGE_SOFTNESS: Float = 0.25;

/// Slack on wedge edges in [`RadialMenuItem::hit`]
const ANGLE_EPSILON: Float = 1e-5;

use MenuError::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MenuError {
    OutOfRange { index: usize, len: usize },
}

pub type MenuResult<T> = Result<T, MenuError>;

/// Ring sector shared by menus and their items.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RadialItem {
    pub radius: Float,
    pub thickness: Float,
    pub start_angle: Float,
    pub end_angle: Float,
}

impl Default for RadialItem {
    fn default() -> Self {
        Self {
            radius: 1.0,
            thickness: 0.5,
            start_angle: 0.0,
            end_angle: TAU,
        }
    }
}

impl RadialItem {
    pub fn angular_width(&self) -> Float {
        self.end_angle - self.start_angle
    }

    pub fn mid_angle(&self) -> Float {
        (self.start_angle + self.end_angle) * 0.5
    }

    pub fn outer_radius(&self) -> Float {
        self.radius + self.thickness
    }

    /// 1 in the core of the wedge, fading to 0 at its edges
    pub fn angular_proximity(&self, angle: Float) -> Float {
        let half = self.angular_width() * 0.5;
        let delta = angular_distance(angle, self.mid_angle());
        if half <= 0.0 || delta >= half {
            return 0.0;
        }
        ((half - delta) / (half * EDGE_SOFTNESS)).min(1.0)
    }
}

/// Called when an item commits.
pub trait ItemEvent {
    fn on_activated(&mut self);
}

impl<F: FnMut()> ItemEvent for F {
    fn on_activated(&mut self) {
        self()
    }
}

pub struct RadialMenuItem {
    sector: RadialItem,
    activation: Smoothed<Float>,
    activated_radius: Float,
    activated_color: Color,
    hover_color: Color,
    icon: Option<SvgPrimitive>,
    icon_scale: Float,
    icon_offset: Triple,
    callback: Option<Box<dyn ItemEvent>>,
    cooldown: bool,
}

impl fmt::Debug for RadialMenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadialMenuItem")
            .field("sector", &self.sector)
            .field("activation", &self.activation)
            .field("activated_radius", &self.activated_radius)
            .field("has_icon", &self.icon.is_some())
            .field("has_callback", &self.callback.is_some())
            .field("cooldown", &self.cooldown)
            .finish()
    }
}

impl Default for RadialMenuItem {
    fn default() -> Self {
        Self {
            sector: RadialItem::default(),
            activation: Smoothed::new(0.0).with_rate(DEFAULT_RATE as Float),
            activated_radius: 2.0,
            activated_color: RGBA::new(0.5, 1.0, 0.5, 1.0),
            hover_color: RGBA::new(0.5, 0.5, 0.5, 0.8),
            icon: None,
            icon_scale: 1.0,
            icon_offset: Triple::zero(),
            callback: None,
            cooldown: false,
        }
    }
}

impl RadialMenuItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sector(&self) -> &RadialItem {
        &self.sector
    }

    pub fn set_activation(&mut self, activation: Float) {
        self.activation.set_goal(activation.clamp(0.0, 1.0));
    }

    pub fn set_activation_rate(&mut self, rate: Float) {
        self.activation.set_rate(rate);
    }

    pub fn set_activated_radius(&mut self, radius: Float) {
        self.activated_radius = radius;
    }

    pub fn activated_radius(&self) -> Float {
        self.activated_radius
    }

    pub fn set_activated_color(&mut self, color: Color) {
        self.activated_color = color;
    }

    pub fn set_hover_color(&mut self, color: Color) {
        self.hover_color = color;
    }

    pub fn set_icon(&mut self, icon: SvgPrimitive) {
        self.icon = Some(icon);
    }

    pub fn icon(&self) -> Option<&SvgPrimitive> {
        self.icon.as_ref()
    }

    pub fn set_icon_placement(&mut self, scale: Float, offset: Triple) {
        self.icon_scale = scale;
        self.icon_offset = offset;
    }

    pub fn set_callback(&mut self, callback: impl ItemEvent + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown
    }

    /// Ratio of the way from `radius` to the activated radius, if `pos`
    /// (relative to the menu center) lies on this wedge.
    pub fn hit(&self, pos: Couple) -> Option<Float> {
        let (angle, distance) = polar(pos);
        let half = self.sector.angular_width() * 0.5;
        match angular_distance(angle, self.sector.mid_angle()) <= half + ANGLE_EPSILON {
            true => self.hit_ratio(distance),
            false => None,
        }
    }

    /// Radial part of [`RadialMenuItem::hit`], for a cursor already known
    /// to be over this wedge.
    pub fn hit_ratio(&self, distance: Float) -> Option<Float> {
        let span = self.activated_radius - self.sector.radius;
        if span <= 0.0 || distance < self.sector.radius || distance > self.activated_radius {
            return None;
        }
        Some((distance - self.sector.radius) / span)
    }

    /// Outer edge of the wedge, growing toward the activated radius
    pub fn current_radius(&self) -> Float {
        let rest = self.sector.outer_radius();
        rest + (self.activated_radius - rest) * self.current_activation()
    }

    pub fn update_activation(&mut self, dt: Float) {
        self.activation.update(dt);
    }

    pub fn current_activation(&self) -> Float {
        self.activation.value()
    }

    pub fn goal_activation(&self) -> Float {
        self.activation.goal()
    }

    /// Fires the callback once per crossing of the commit threshold.
    pub fn check_fire_callback(&mut self) -> bool {
        let activation = self.current_activation();
        if self.cooldown {
            if activation < RESET_THRESHOLD {
                self.cooldown = false;
            }
            return false;
        }
        if activation < COMMIT_THRESHOLD {
            return false;
        }

        self.cooldown = true;
        if let Some(callback) = self.callback.as_mut() {
            callback.on_activated();
        }
        true
    }

    pub fn calculate_color(&self) -> Color {
        let t = self.current_activation();
        let (h, a) = (self.hover_color, self.activated_color);
        let lerp = |from: Float, to: Float| from + (to - from) * t;
        RGBA::new(lerp(h.r, a.r), lerp(h.g, a.g), lerp(h.b, a.b), lerp(h.a, a.a))
    }

    /// Goal activation for a cursor at `angle` / `distance` from the center
    fn proximity(&self, angle: Float, distance: Float) -> Float {
        let span = self.activated_radius - self.sector.radius;
        if span <= 0.0 || distance < self.sector.radius {
            return 0.0;
        }
        let radial = ((distance - self.sector.radius) / span).clamp(0.0, 1.0);
        radial * self.sector.angular_proximity(angle)
    }

    fn renderables(&mut self, center: Couple, resolution: usize, out: &mut Vec<Renderable>) {
        let sector = self.sector;
        let color = self.calculate_color();
        let origin = Triple::new(center.x, center.y, 0.0);

        let mut wedge = PrimitiveGeometry::partial_disk(
            sector.radius,
            self.current_radius(),
            sector.start_angle,
            sector.end_angle,
            resolution,
        );
        wedge.translate(origin);
        out.push(Renderable::Fill(GenericShape::new(wedge, DrawMode::Triangles, color)));

        let mut goal = PrimitiveGeometry::new();
        let steps = resolution.max(1);
        for i in 0..=steps {
            let angle = sector.start_angle + sector.angular_width() * i as Float / steps as Float;
            let p = center + cartesian(angle, self.activated_radius);
            goal.vertices_mut().push(VertexAttributes::planar(p));
        }
        let goal_color = RGBA::new(color.r, color.g, color.b, color.a * 0.5);
        out.push(Renderable::Stroke(GenericShape::new(goal, DrawMode::LineStrip, goal_color)));

        if let Some(icon) = self.icon.as_mut() {
            icon.update();
            let size = icon.size();
            let anchor = center
                + cartesian(sector.mid_angle(), sector.radius + sector.thickness * 0.5)
                + Couple::new(self.icon_offset.x, self.icon_offset.y);
            let scale = self.icon_scale;
            // svg is y-down
            let place = |p: Couple| anchor + Couple::new(p.x - size.x * 0.5, size.y * 0.5 - p.y) * scale;
            out.extend(icon.children().iter().map(|child| child.map_points(place)));
        }
    }
}

/// Menu placement and sizing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MenuConfig {
    pub center: Couple,
    pub radius: Float,
    pub thickness: Float,
    pub activated_radius: Float,
    pub reference_angle: Float,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            center: Couple::zero(),
            radius: 1.0,
            thickness: 0.5,
            activated_radius: 2.0,
            reference_angle: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UpdateResult {
    /// item that committed during this update
    pub committed: Option<usize>,
    /// its activation, 0 when nothing committed
    pub activation: Float,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HitResult {
    pub index: usize,
    pub ratio: Float,
}

#[derive(Debug, Default)]
pub struct RadialMenu {
    config: MenuConfig,
    items: Vec<RadialMenuItem>,
}

impl RadialMenu {
    pub fn new(config: MenuConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
        }
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    /// Relays out every item, overriding per-item radii.
    pub fn set_config(&mut self, config: MenuConfig) {
        self.config = config;
        self.update_item_layout();
    }

    pub fn set_num_items(&mut self, num: usize) {
        self.items.resize_with(num, RadialMenuItem::new);
        self.update_item_layout();
        log::debug!("radial menu resized to {} items", num);
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn item(&self, index: usize) -> MenuResult<&RadialMenuItem> {
        let len = self.items.len();
        self.items.get(index).ok_or(OutOfRange { index, len })
    }

    pub fn item_mut(&mut self, index: usize) -> MenuResult<&mut RadialMenuItem> {
        let len = self.items.len();
        self.items.get_mut(index).ok_or(OutOfRange { index, len })
    }

    pub fn items(&self) -> impl Iterator<Item = &RadialMenuItem> {
        self.items.iter()
    }

    pub fn slot_width(&self) -> Float {
        match self.items.len() {
            0 => 0.0,
            n => TAU / n as Float,
        }
    }

    /// Slot whose wedge spans `angle`
    pub fn slot_from_angle(&self, angle: Float) -> Option<usize> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }
        let w = self.slot_width();
        let shifted = normalize_angle(angle - self.config.reference_angle + w * 0.5);
        Some(((shifted / w) as usize).min(n - 1))
    }

    /// Pure hit test of a point against the wedges.
    pub fn item_from_point(&self, pos: Couple) -> Option<HitResult> {
        let (angle, distance) = polar(pos - self.config.center);
        let index = self.slot_from_angle(angle)?;
        let ratio = self.items[index].hit_ratio(distance)?;
        Some(HitResult { index, ratio })
    }

    /// Eases every item toward its proximity to the cursor and fires
    /// the callbacks of items crossing the commit threshold.
    pub fn update_items_from_cursor(&mut self, cursor: Couple, dt: Float) -> UpdateResult {
        let (angle, distance) = polar(cursor - self.config.center);
        let mut result = UpdateResult {
            committed: None,
            activation: 0.0,
        };

        for (i, item) in self.items.iter_mut().enumerate() {
            let goal = item.proximity(angle, distance);
            item.set_activation(goal);
            item.update_activation(dt);
            if item.check_fire_callback() && result.committed.is_none() {
                log::info!("radial menu item {} committed", i);
                result = UpdateResult {
                    committed: Some(i),
                    activation: item.current_activation(),
                };
            }
        }

        result
    }

    /// Wedges, goal arcs and icons of every item, back to front.
    pub fn geometry(&mut self, resolution: usize) -> Vec<Renderable> {
        let mut out = Vec::with_capacity(self.items.len() * 2);
        let center = self.config.center;
        for item in &mut self.items {
            item.renderables(center, resolution, &mut out);
        }
        out
    }

    fn update_item_layout(&mut self) {
        let w = self.slot_width();
        let config = self.config;
        for (i, item) in self.items.iter_mut().enumerate() {
            let mid = config.reference_angle + w * i as Float;
            item.sector = RadialItem {
                radius: config.radius,
                thickness: config.thickness,
                start_angle: mid - w * 0.5,
                end_angle: mid + w * 0.5,
            };
            item.activated_radius = config.activated_radius;
        }
    }
}
