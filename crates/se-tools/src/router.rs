//! Tool Router
//!
//! Maps named tools with JSON arguments onto the sketch session and the
//! feature dispatcher. Every call produces one JSON record, either
//! `{"status": ...}` or `{"error": ..., "kind": ...}`.

use std::io::{BufRead, Write};

use glam::DVec2;
use se_cad::kernel::CadEngine;
use se_cad::{
    ConstraintKind, FeatureFamily, Keypoint, PlaneRef, SessionError, SketchEntity,
    SketchSession, dispatch_args, error_record,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ToolConfig;

/// Prefix of the per-family feature tools
const FEATURE_PREFIX: &str = "create_";

/// Error type for tool calls
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl ToolError {
    /// Render as an error record
    pub fn to_record(&self) -> Value {
        match self {
            ToolError::Session(e) => error_record(e),
            ToolError::UnknownTool(_) => json!({
                "error": self.to_string(),
                "kind": "unknown_method",
            }),
            ToolError::InvalidArguments { .. } => json!({
                "error": self.to_string(),
                "kind": "invalid_parameter",
            }),
            ToolError::Serialize(_) => json!({
                "error": self.to_string(),
                "kind": "external_engine_error",
            }),
        }
    }
}

/// Description of one tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Argument key selecting the variant, for feature tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<&'static str>,
}

const SKETCH_TOOLS: &[(&str, &str)] = &[
    ("create_sketch", "Open a sketch on Top/XZ, Front/XY or Right/YZ"),
    ("create_sketch_on_plane", "Open a sketch on a plane by 1-based index"),
    ("draw_line", "Draw a line from (x1, y1) to (x2, y2) in metres"),
    ("draw_circle", "Draw a circle by centre and radius"),
    ("draw_rectangle", "Draw a rectangle from two opposite corners"),
    ("draw_arc", "Draw an arc by centre, radius and angles in degrees"),
    ("draw_polygon", "Draw a regular polygon by centre, radius and side count"),
    ("draw_ellipse", "Draw an ellipse by centre, radii and rotation in degrees"),
    ("draw_spline", "Draw a B-spline through [x, y] points"),
    ("draw_point", "Draw a point"),
    ("draw_arc_by_3_points", "Draw an arc from a start point around a centre to an end point"),
    ("draw_circle_by_2_points", "Draw a circle from two diametrically opposite points"),
    ("draw_circle_by_3_points", "Draw a circle through three points"),
    ("add_constraint", "Constrain entities of the open sketch, referenced by entity index"),
    ("add_keypoint_constraint", "Join a keypoint (start, end, center) of one entity to another"),
    ("set_axis_of_revolution", "Draw a construction line and use it as the axis of revolution"),
    ("close_sketch", "Validate and close the open sketch"),
    ("get_sketch_info", "Report the session state and entity counts"),
    ("reset_session", "Discard the open sketch and all accumulated profiles"),
    ("list_tools", "List every tool"),
];

// ============== Arguments ==============

fn default_plane() -> String {
    "Top".into()
}

#[derive(Deserialize)]
struct SketchArgs {
    #[serde(default = "default_plane")]
    plane: String,
}

#[derive(Deserialize)]
struct PlaneIndexArgs {
    plane_index: u32,
}

#[derive(Deserialize)]
struct TwoPointArgs {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

#[derive(Deserialize)]
struct CircleArgs {
    center_x: f64,
    center_y: f64,
    radius: f64,
}

#[derive(Deserialize)]
struct ArcArgs {
    center_x: f64,
    center_y: f64,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
}

#[derive(Deserialize)]
struct PolygonArgs {
    center_x: f64,
    center_y: f64,
    radius: f64,
    sides: u32,
}

#[derive(Deserialize)]
struct EllipseArgs {
    center_x: f64,
    center_y: f64,
    major_radius: f64,
    minor_radius: f64,
    #[serde(default)]
    angle: f64,
}

#[derive(Deserialize)]
struct SplineArgs {
    points: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
struct PointArgs {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct ArcThreePointArgs {
    start_x: f64,
    start_y: f64,
    center_x: f64,
    center_y: f64,
    end_x: f64,
    end_y: f64,
}

#[derive(Deserialize)]
struct ThreePointArgs {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    x3: f64,
    y3: f64,
}

#[derive(Deserialize)]
struct ConstraintArgs {
    constraint_type: String,
    elements: Vec<usize>,
}

#[derive(Deserialize)]
struct KeypointConstraintArgs {
    element1_index: usize,
    keypoint1: Keypoint,
    element2_index: usize,
    keypoint2: Keypoint,
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

// ============== Router ==============

/// Routes tool calls to one session and one engine
pub struct ToolRouter {
    session: SketchSession,
    engine: Box<dyn CadEngine>,
}

impl ToolRouter {
    /// Create a router over a session and an engine
    pub fn new(session: SketchSession, engine: Box<dyn CadEngine>) -> Self {
        Self { session, engine }
    }

    /// Create a router from configuration
    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(
            SketchSession::new(config.session.clone()),
            config.engine.create(),
        )
    }

    /// Get the session
    pub fn session(&self) -> &SketchSession {
        &self.session
    }

    /// Get the engine name
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Describe every tool
    pub fn definitions() -> Vec<ToolDefinition> {
        let sketch = SKETCH_TOOLS.iter().map(|(name, description)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            discriminator: None,
            methods: Vec::new(),
        });
        let features = FeatureFamily::ALL.iter().map(|family| ToolDefinition {
            name: format!("{FEATURE_PREFIX}{}", family.as_str()),
            description: format!("Create a {} feature", family.display_name().to_lowercase()),
            discriminator: Some(family.discriminator()),
            methods: family.methods(),
        });
        sketch.chain(features).collect()
    }

    /// Call a tool and render the outcome as a record
    pub fn call(&mut self, name: &str, args: Value) -> Value {
        match self.try_call(name, args) {
            Ok(record) => record,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                e.to_record()
            }
        }
    }

    /// Call a tool
    pub fn try_call(&mut self, name: &str, args: Value) -> Result<Value, ToolError> {
        debug!(tool = name, "Tool call");
        let engine = self.engine.as_mut();
        let session = &mut self.session;

        match name {
            "create_sketch" => {
                let args: SketchArgs = parse_args(name, args)?;
                let plane: PlaneRef = args.plane.parse()?;
                session.open(engine, plane)?;
                Ok(json!({
                    "status": "created",
                    "plane": plane.to_string(),
                    "plane_index": plane.index(),
                }))
            }
            "create_sketch_on_plane" => {
                let args: PlaneIndexArgs = parse_args(name, args)?;
                let plane = PlaneRef::Index(args.plane_index);
                session.open(engine, plane)?;
                Ok(json!({
                    "status": "created",
                    "plane_index": args.plane_index,
                }))
            }
            "draw_line" => {
                let a: TwoPointArgs = parse_args(name, args)?;
                let handle = session.draw(engine, SketchEntity::line(a.x1, a.y1, a.x2, a.y2))?;
                Ok(json!({
                    "status": "created",
                    "type": "line",
                    "entity_index": handle.index(),
                    "start": [a.x1, a.y1],
                    "end": [a.x2, a.y2],
                }))
            }
            "draw_circle" => {
                let a: CircleArgs = parse_args(name, args)?;
                let handle =
                    session.draw(engine, SketchEntity::circle(a.center_x, a.center_y, a.radius))?;
                Ok(json!({
                    "status": "created",
                    "type": "circle",
                    "entity_index": handle.index(),
                    "center": [a.center_x, a.center_y],
                    "radius": a.radius,
                }))
            }
            "draw_rectangle" => {
                let a: TwoPointArgs = parse_args(name, args)?;
                let handles = session.draw_rectangle(
                    engine,
                    DVec2::new(a.x1, a.y1),
                    DVec2::new(a.x2, a.y2),
                )?;
                Ok(json!({
                    "status": "created",
                    "type": "rectangle",
                    "entities": handles.len(),
                    "corner1": [a.x1, a.y1],
                    "corner2": [a.x2, a.y2],
                }))
            }
            "draw_arc" => {
                let a: ArcArgs = parse_args(name, args)?;
                let entity =
                    SketchEntity::arc(a.center_x, a.center_y, a.radius, a.start_angle, a.end_angle);
                let handle = session.draw(engine, entity)?;
                Ok(json!({
                    "status": "created",
                    "type": "arc",
                    "entity_index": handle.index(),
                    "center": [a.center_x, a.center_y],
                    "radius": a.radius,
                    "start_angle": a.start_angle,
                    "end_angle": a.end_angle,
                }))
            }
            "draw_polygon" => {
                let a: PolygonArgs = parse_args(name, args)?;
                let handles = session.draw_polygon(
                    engine,
                    DVec2::new(a.center_x, a.center_y),
                    a.radius,
                    a.sides,
                )?;
                Ok(json!({
                    "status": "created",
                    "type": "polygon",
                    "sides": a.sides,
                    "entities": handles.len(),
                    "center": [a.center_x, a.center_y],
                    "radius": a.radius,
                }))
            }
            "draw_ellipse" => {
                let a: EllipseArgs = parse_args(name, args)?;
                let entity = SketchEntity::ellipse(
                    a.center_x,
                    a.center_y,
                    a.major_radius,
                    a.minor_radius,
                    a.angle,
                );
                let handle = session.draw(engine, entity)?;
                Ok(json!({
                    "status": "created",
                    "type": "ellipse",
                    "entity_index": handle.index(),
                    "center": [a.center_x, a.center_y],
                    "major_radius": a.major_radius,
                    "minor_radius": a.minor_radius,
                    "angle": a.angle,
                }))
            }
            "draw_spline" => {
                let a: SplineArgs = parse_args(name, args)?;
                let points = a.points.iter().map(|&[x, y]| DVec2::new(x, y)).collect();
                let handle = session.draw_spline(engine, points)?;
                Ok(json!({
                    "status": "created",
                    "type": "spline",
                    "entity_index": handle.index(),
                    "num_points": a.points.len(),
                }))
            }
            "draw_point" => {
                let a: PointArgs = parse_args(name, args)?;
                let handle = session.draw(engine, SketchEntity::point(a.x, a.y))?;
                Ok(json!({
                    "status": "created",
                    "type": "point",
                    "entity_index": handle.index(),
                    "position": [a.x, a.y],
                }))
            }
            "draw_arc_by_3_points" => {
                let a: ArcThreePointArgs = parse_args(name, args)?;
                let handle = session.draw_arc_by_3_points(
                    engine,
                    DVec2::new(a.start_x, a.start_y),
                    DVec2::new(a.center_x, a.center_y),
                    DVec2::new(a.end_x, a.end_y),
                )?;
                Ok(json!({
                    "status": "created",
                    "type": "arc",
                    "entity_index": handle.index(),
                    "start": [a.start_x, a.start_y],
                    "center": [a.center_x, a.center_y],
                    "end": [a.end_x, a.end_y],
                }))
            }
            "draw_circle_by_2_points" => {
                let a: TwoPointArgs = parse_args(name, args)?;
                let handle = session.draw_circle_by_2_points(
                    engine,
                    DVec2::new(a.x1, a.y1),
                    DVec2::new(a.x2, a.y2),
                )?;
                Ok(json!({
                    "status": "created",
                    "type": "circle",
                    "entity_index": handle.index(),
                    "point1": [a.x1, a.y1],
                    "point2": [a.x2, a.y2],
                }))
            }
            "draw_circle_by_3_points" => {
                let a: ThreePointArgs = parse_args(name, args)?;
                let handle = session.draw_circle_by_3_points(
                    engine,
                    DVec2::new(a.x1, a.y1),
                    DVec2::new(a.x2, a.y2),
                    DVec2::new(a.x3, a.y3),
                )?;
                Ok(json!({
                    "status": "created",
                    "type": "circle",
                    "entity_index": handle.index(),
                    "point1": [a.x1, a.y1],
                    "point2": [a.x2, a.y2],
                    "point3": [a.x3, a.y3],
                }))
            }
            "add_constraint" => {
                let a: ConstraintArgs = parse_args(name, args)?;
                let kind = ConstraintKind::parse(&a.constraint_type)?;
                let handles = a
                    .elements
                    .iter()
                    .map(|&index| session.entity_handle(index))
                    .collect::<Result<Vec<_>, _>>()?;
                session.add_constraint(engine, kind, &handles)?;
                Ok(json!({
                    "status": "constraint_added",
                    "type": kind.as_str(),
                    "elements": a.elements,
                }))
            }
            "add_keypoint_constraint" => {
                let a: KeypointConstraintArgs = parse_args(name, args)?;
                let first = session.entity_handle(a.element1_index)?;
                let second = session.entity_handle(a.element2_index)?;
                session.add_keypoint_constraint(
                    engine,
                    (first, a.keypoint1),
                    (second, a.keypoint2),
                )?;
                Ok(json!({
                    "status": "constraint_added",
                    "type": "keypoint",
                    "element1_index": a.element1_index,
                    "keypoint1": a.keypoint1,
                    "element2_index": a.element2_index,
                    "keypoint2": a.keypoint2,
                }))
            }
            "set_axis_of_revolution" => {
                let a: TwoPointArgs = parse_args(name, args)?;
                let handle = session.draw_axis_of_revolution(
                    engine,
                    DVec2::new(a.x1, a.y1),
                    DVec2::new(a.x2, a.y2),
                )?;
                Ok(json!({
                    "status": "axis_set",
                    "entity_index": handle.index(),
                    "start": [a.x1, a.y1],
                    "end": [a.x2, a.y2],
                }))
            }
            "close_sketch" => {
                let handle = session.close(engine)?;
                let profile = session.profile(handle)?;
                Ok(json!({
                    "status": "closed",
                    "flags": profile.flags().map(|f| f.bits()),
                    "axis_set": profile.has_axis(),
                    "accumulated_profiles": session.accumulated_profiles().len(),
                }))
            }
            "get_sketch_info" => serde_json::to_value(session.info())
                .map_err(|e| ToolError::Serialize(e.to_string())),
            "reset_session" => {
                session.reset();
                Ok(json!({ "status": "reset" }))
            }
            "list_tools" => Ok(json!({ "tools": Self::definitions() })),
            other => {
                let family = other
                    .strip_prefix(FEATURE_PREFIX)
                    .and_then(FeatureFamily::parse)
                    .ok_or_else(|| ToolError::UnknownTool(other.to_string()))?;
                let created = dispatch_args(session, engine, family, &args)?;
                Ok(created.to_record())
            }
        }
    }
}

// ============== Script Runner ==============

/// One line of a tool script
#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

/// Run newline-delimited tool calls, writing one record per call
///
/// Blank lines are skipped. A malformed line produces an error record and the
/// run continues. Returns the number of calls processed.
pub fn run_script(
    router: &mut ToolRouter,
    reader: impl BufRead,
    mut writer: impl Write,
) -> std::io::Result<usize> {
    let mut processed = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<ToolCall>(line) {
            Ok(call) => router.call(&call.tool, call.args),
            Err(e) => {
                warn!(error = %e, "Malformed tool call");
                json!({
                    "error": format!("Malformed tool call: {e}"),
                    "kind": "invalid_parameter",
                })
            }
        };
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        processed += 1;
    }
    writer.flush()?;
    Ok(processed)
}
