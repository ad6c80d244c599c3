//! Sketch Entities
//!
//! 2D geometry drawn into a profile. Coordinates are in metres on the
//! profile plane and angles in degrees.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult, ensure_finite, ensure_positive};

/// Kind of a sketch entity, used for counting and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Line,
    Circle,
    Arc,
    Ellipse,
    Spline,
    Point,
}

impl EntityKind {
    /// Get the display name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Line => "line",
            EntityKind::Circle => "circle",
            EntityKind::Arc => "arc",
            EntityKind::Ellipse => "ellipse",
            EntityKind::Spline => "spline",
            EntityKind::Point => "point",
        }
    }
}

/// A 2D entity in a sketch profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SketchEntity {
    /// A straight line segment
    Line { start: DVec2, end: DVec2 },

    /// A full circle
    Circle { center: DVec2, radius: f64 },

    /// A circular arc, counter-clockwise from `start_angle` to `end_angle`
    Arc {
        center: DVec2,
        radius: f64,
        /// Start angle in degrees
        start_angle: f64,
        /// End angle in degrees
        end_angle: f64,
    },

    /// An ellipse
    Ellipse {
        center: DVec2,
        major_radius: f64,
        minor_radius: f64,
        /// Rotation of the major axis in degrees
        angle: f64,
    },

    /// A B-spline through fit points
    Spline { points: Vec<DVec2>, order: u32 },

    /// A standalone point
    Point { position: DVec2 },
}

impl SketchEntity {
    /// Create a line from coordinates
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        SketchEntity::Line {
            start: DVec2::new(x1, y1),
            end: DVec2::new(x2, y2),
        }
    }

    /// Create a circle from a centre and radius
    pub fn circle(cx: f64, cy: f64, radius: f64) -> Self {
        SketchEntity::Circle {
            center: DVec2::new(cx, cy),
            radius,
        }
    }

    /// Create an arc from a centre, radius and angles in degrees
    pub fn arc(cx: f64, cy: f64, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        SketchEntity::Arc {
            center: DVec2::new(cx, cy),
            radius,
            start_angle,
            end_angle,
        }
    }

    /// Create an ellipse
    pub fn ellipse(cx: f64, cy: f64, major_radius: f64, minor_radius: f64, angle: f64) -> Self {
        SketchEntity::Ellipse {
            center: DVec2::new(cx, cy),
            major_radius,
            minor_radius,
            angle,
        }
    }

    /// Create a spline through points
    pub fn spline(points: Vec<DVec2>, order: u32) -> Self {
        SketchEntity::Spline { points, order }
    }

    /// Create a point
    pub fn point(x: f64, y: f64) -> Self {
        SketchEntity::Point {
            position: DVec2::new(x, y),
        }
    }

    /// Four lines bounding the axis-aligned rectangle between two corners
    pub fn rectangle(corner1: DVec2, corner2: DVec2) -> [SketchEntity; 4] {
        let a = corner1;
        let b = DVec2::new(corner2.x, corner1.y);
        let c = corner2;
        let d = DVec2::new(corner1.x, corner2.y);
        [
            SketchEntity::Line { start: a, end: b },
            SketchEntity::Line { start: b, end: c },
            SketchEntity::Line { start: c, end: d },
            SketchEntity::Line { start: d, end: a },
        ]
    }

    /// Lines of a regular polygon inscribed in a circle
    ///
    /// The first vertex lies on the positive X direction from the centre.
    pub fn polygon(center: DVec2, radius: f64, sides: u32) -> SessionResult<Vec<SketchEntity>> {
        if sides < 3 {
            return Err(SessionError::invalid_parameter(
                "sides",
                format!("a polygon needs at least 3 sides, got {sides}"),
            ));
        }
        ensure_finite("center", center.x)?;
        ensure_finite("center", center.y)?;
        ensure_positive("radius", radius)?;

        let step = std::f64::consts::TAU / f64::from(sides);
        let vertices: Vec<DVec2> = (0..sides)
            .map(|i| center + radius * DVec2::from_angle(step * f64::from(i)))
            .collect();
        Ok(vertices
            .iter()
            .zip(vertices.iter().cycle().skip(1))
            .map(|(start, end)| SketchEntity::Line {
                start: *start,
                end: *end,
            })
            .collect())
    }

    /// Arc from a start point around a centre, ending on the ray through `end`
    pub fn arc_by_3_points(start: DVec2, center: DVec2, end: DVec2) -> SessionResult<Self> {
        ensure_point("start", start)?;
        ensure_point("center", center)?;
        ensure_point("end", end)?;
        let radius = start.distance(center);
        ensure_positive("radius", radius)?;
        if end == center {
            return Err(SessionError::invalid_parameter(
                "end",
                "the end point coincides with the centre",
            ));
        }

        let angle = |p: DVec2| {
            let d = p - center;
            d.y.atan2(d.x).to_degrees()
        };
        let start_angle = angle(start);
        let mut end_angle = angle(end);
        if end_angle <= start_angle {
            end_angle += 360.0;
        }
        Ok(SketchEntity::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        })
    }

    /// Circle through two diametrically opposite points
    pub fn circle_by_2_points(p1: DVec2, p2: DVec2) -> SessionResult<Self> {
        ensure_point("p1", p1)?;
        ensure_point("p2", p2)?;
        let radius = p1.distance(p2) / 2.0;
        ensure_positive("radius", radius)?;
        Ok(SketchEntity::Circle {
            center: (p1 + p2) / 2.0,
            radius,
        })
    }

    /// Circle through three points
    pub fn circle_by_3_points(p1: DVec2, p2: DVec2, p3: DVec2) -> SessionResult<Self> {
        ensure_point("p1", p1)?;
        ensure_point("p2", p2)?;
        ensure_point("p3", p3)?;

        let b = p2 - p1;
        let c = p3 - p1;
        let d = 2.0 * b.perp_dot(c);
        let scale = b.length_squared().max(c.length_squared());
        if d.abs() <= f64::EPSILON * scale {
            return Err(SessionError::invalid_parameter(
                "points",
                "the three points are collinear or coincident",
            ));
        }

        let offset = DVec2::new(
            c.y * b.length_squared() - b.y * c.length_squared(),
            b.x * c.length_squared() - c.x * b.length_squared(),
        ) / d;
        Ok(SketchEntity::Circle {
            center: p1 + offset,
            radius: offset.length(),
        })
    }

    /// Get the kind of this entity
    pub fn kind(&self) -> EntityKind {
        match self {
            SketchEntity::Line { .. } => EntityKind::Line,
            SketchEntity::Circle { .. } => EntityKind::Circle,
            SketchEntity::Arc { .. } => EntityKind::Arc,
            SketchEntity::Ellipse { .. } => EntityKind::Ellipse,
            SketchEntity::Spline { .. } => EntityKind::Spline,
            SketchEntity::Point { .. } => EntityKind::Point,
        }
    }

    /// Check if this entity is a line
    pub fn is_line(&self) -> bool {
        matches!(self, SketchEntity::Line { .. })
    }

    /// Check if the entity has collapsed to nothing
    ///
    /// Only a line with coincident end points or a spline whose points all
    /// coincide qualifies. Drawing such an entity is allowed; closure rejects it.
    pub fn is_degenerate(&self) -> bool {
        match self {
            SketchEntity::Line { start, end } => start == end,
            SketchEntity::Spline { points, .. } => points.windows(2).all(|w| w[0] == w[1]),
            _ => false,
        }
    }

    /// Check coordinates and arity before the entity reaches the engine
    ///
    /// Geometric validity of the profile as a whole is left to closure.
    pub fn validate(&self) -> SessionResult<()> {
        match self {
            SketchEntity::Line { start, end } => {
                ensure_point("start", *start)?;
                ensure_point("end", *end)
            }
            SketchEntity::Circle { center, radius } => {
                ensure_point("center", *center)?;
                ensure_positive("radius", *radius)
            }
            SketchEntity::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                ensure_point("center", *center)?;
                ensure_positive("radius", *radius)?;
                ensure_finite("start_angle", *start_angle)?;
                ensure_finite("end_angle", *end_angle)
            }
            SketchEntity::Ellipse {
                center,
                major_radius,
                minor_radius,
                angle,
            } => {
                ensure_point("center", *center)?;
                ensure_positive("major_radius", *major_radius)?;
                ensure_positive("minor_radius", *minor_radius)?;
                ensure_finite("angle", *angle)
            }
            SketchEntity::Spline { points, order } => {
                if points.len() < 2 {
                    return Err(SessionError::invalid_parameter(
                        "points",
                        format!("a spline needs at least 2 points, got {}", points.len()),
                    ));
                }
                if *order < 2 {
                    return Err(SessionError::invalid_parameter(
                        "order",
                        format!("spline order must be at least 2, got {order}"),
                    ));
                }
                points.iter().try_for_each(|p| ensure_point("points", *p))
            }
            SketchEntity::Point { position } => ensure_point("position", *position),
        }
    }
}

fn ensure_point(name: &str, point: DVec2) -> SessionResult<()> {
    ensure_finite(name, point.x)?;
    ensure_finite(name, point.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_is_closed_loop() {
        let lines = SketchEntity::rectangle(DVec2::new(-0.1, -0.15), DVec2::new(0.1, 0.15));
        for (i, line) in lines.iter().enumerate() {
            let SketchEntity::Line { end, .. } = line else {
                panic!("expected a line");
            };
            let SketchEntity::Line { start: next, .. } = &lines[(i + 1) % 4] else {
                panic!("expected a line");
            };
            assert_eq!(end, next);
        }
    }

    #[test]
    fn test_polygon_vertices_on_circle() {
        let lines = SketchEntity::polygon(DVec2::ZERO, 0.05, 6).unwrap();
        assert_eq!(lines.len(), 6);
        for line in &lines {
            let SketchEntity::Line { start, .. } = line else {
                panic!("expected a line");
            };
            assert_relative_eq!(start.length(), 0.05, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_polygon_needs_three_sides() {
        assert!(SketchEntity::polygon(DVec2::ZERO, 0.05, 2).is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(SketchEntity::circle(0.0, 0.0, 0.005).validate().is_ok());
        assert!(SketchEntity::circle(f64::NAN, 0.0, 0.005).validate().is_err());
        assert!(SketchEntity::circle(0.0, 0.0, -1.0).validate().is_err());
    }

    #[test]
    fn test_zero_length_line_is_drawable_but_degenerate() {
        let line = SketchEntity::line(0.0, 0.0, 0.0, 0.0);
        assert!(line.validate().is_ok());
        assert!(line.is_degenerate());
        assert!(!SketchEntity::line(0.0, 0.0, 0.0, 0.1).is_degenerate());
    }

    #[test]
    fn test_circle_by_3_points() {
        let circle = SketchEntity::circle_by_3_points(
            DVec2::new(0.01, 0.0),
            DVec2::new(0.0, 0.01),
            DVec2::new(-0.01, 0.0),
        )
        .unwrap();
        let SketchEntity::Circle { center, radius } = circle else {
            panic!("expected a circle");
        };
        assert_relative_eq!(center.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(radius, 0.01, epsilon = 1e-12);

        let collinear = SketchEntity::circle_by_3_points(
            DVec2::ZERO,
            DVec2::new(0.01, 0.01),
            DVec2::new(0.02, 0.02),
        );
        assert!(collinear.is_err());
    }

    #[test]
    fn test_circle_by_2_points() {
        let circle =
            SketchEntity::circle_by_2_points(DVec2::new(0.0, 0.0), DVec2::new(0.02, 0.0)).unwrap();
        assert_eq!(circle, SketchEntity::circle(0.01, 0.0, 0.01));
        assert!(SketchEntity::circle_by_2_points(DVec2::ONE, DVec2::ONE).is_err());
    }

    #[test]
    fn test_arc_by_3_points_runs_counter_clockwise() {
        let arc = SketchEntity::arc_by_3_points(
            DVec2::new(0.0, -0.01),
            DVec2::ZERO,
            DVec2::new(0.01, 0.0),
        )
        .unwrap();
        let SketchEntity::Arc {
            radius,
            start_angle,
            end_angle,
            ..
        } = arc
        else {
            panic!("expected an arc");
        };
        assert_relative_eq!(radius, 0.01, epsilon = 1e-12);
        assert_relative_eq!(start_angle, -90.0, epsilon = 1e-9);
        assert_relative_eq!(end_angle, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_spline_arity() {
        let one = SketchEntity::spline(vec![DVec2::ZERO], 3);
        assert!(one.validate().is_err());
        let two = SketchEntity::spline(vec![DVec2::ZERO, DVec2::ONE], 3);
        assert!(two.validate().is_ok());
    }

    #[test]
    fn test_entity_serializes_with_kind_tag() {
        let json = serde_json::to_value(SketchEntity::point(1.0, 2.0)).unwrap();
        assert_eq!(json["kind"], "point");
        assert_eq!(json["position"], serde_json::json!([1.0, 2.0]));
    }
}
