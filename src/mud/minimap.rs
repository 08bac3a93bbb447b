//! Minimap rendering: a player dot plus one node per exit, positioned by a
//! fixed per-direction offset table. Layout is pure; only `draw` touches the
//! canvas.

use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlCanvasElement;

use crate::mud::state::Room;

const EXIT_DISTANCE: f64 = 40.0;
const EXIT_RADIUS: f64 = 8.0;
const PLAYER_RADIUS: f64 = 6.0;
const LABEL_PUSH: f64 = 15.0;
/// Player dot sits slightly above center so "down"/"exit" nodes have room.
const CENTER_Y_LIFT: f64 = 10.0;

/// Unit-ish offset for a direction name. Unknown directions collapse onto
/// the player dot rather than erroring.
pub fn exit_offset(direction: &str) -> (f64, f64) {
    match direction {
        "n" => (0.0, -1.0),
        "s" => (0.0, 1.0),
        "e" => (1.0, 0.0),
        "w" => (-1.0, 0.0),
        "nw" => (-0.7, -0.7),
        "ne" => (0.7, -0.7),
        "sw" => (-0.7, 0.7),
        "se" => (0.7, 0.7),
        "up" => (0.5, -0.5),
        "down" => (-0.5, 0.5),
        "enter" => (0.0, 0.0),
        "exit" => (0.0, 1.5),
        _ => (0.0, 0.0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitNode {
    pub direction: String,
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub label_x: f64,
    pub label_y: f64,
}

/// Positions each exit around the player dot at `(cx, cy)`. Labels are the
/// uppercased first letter, pushed out past the node along the same ray.
pub fn layout_exits(room: &Room, cx: f64, cy: f64) -> Vec<ExitNode> {
    room.exits
        .keys()
        .map(|direction| {
            let (dx, dy) = exit_offset(direction);
            let label = direction
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase().to_string())
                .unwrap_or_default();
            ExitNode {
                direction: direction.clone(),
                x: cx + dx * EXIT_DISTANCE,
                y: cy + dy * EXIT_DISTANCE,
                label,
                label_x: cx + dx * (EXIT_DISTANCE + LABEL_PUSH),
                label_y: cy + dy * (EXIT_DISTANCE + LABEL_PUSH),
            }
        })
        .collect()
}

pub fn draw(canvas: &HtmlCanvasElement, room: &Room) -> Result<(), JsValue> {
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("minimap: no 2d context"))?
        .dyn_into::<web_sys::CanvasRenderingContext2d>()?;

    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let cx = w / 2.0;
    let cy = h / 2.0 - CENTER_Y_LIFT;

    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_line_width(3.0);
    ctx.set_line_cap("round");

    let nodes = layout_exits(room, cx, cy);

    for node in &nodes {
        ctx.set_stroke_style_str("#0284c7");
        ctx.begin_path();
        ctx.move_to(cx, cy);
        ctx.line_to(node.x, node.y);
        ctx.stroke();

        ctx.set_fill_style_str("#0ea5e9");
        ctx.begin_path();
        ctx.arc(node.x, node.y, EXIT_RADIUS, 0.0, PI * 2.0)?;
        ctx.fill();

        ctx.set_fill_style_str("#fff");
        ctx.set_font("10px monospace");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.fill_text(&node.label, node.label_x, node.label_y)?;
    }

    // Player dot on top, with a glow.
    ctx.set_shadow_color("#fbbf24");
    ctx.set_shadow_blur(10.0);
    ctx.set_fill_style_str("#fbbf24");
    ctx.begin_path();
    ctx.arc(cx, cy, PLAYER_RADIUS, 0.0, PI * 2.0)?;
    ctx.fill();
    ctx.set_shadow_blur(0.0);

    Ok(())
}
