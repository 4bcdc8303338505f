// src/geometry.rs
//
// Face layout for the CSS-built primitives and matrix3d formatting.
// All sizes are CSS pixels: scale * unit.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt::Write;

use glam::{EulerRot, Mat4, Vec3};

use crate::engine_lib::scene_types::NodeKind;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLayout {
    pub name: &'static str,
    pub width: f32,
    pub height: f32,
    /// Placement relative to the node's origin.
    pub transform: Mat4,
}

/// Faces making up a node of `kind`, sized by `scale * unit`.
///
/// Boxes face outward, rooms face inward. Planes and avatars are a single face
/// in the node's XY plane; empty nodes have none.
pub fn face_layouts(kind: NodeKind, scale: Vec3, unit: f32) -> Vec<FaceLayout> {
    let size = scale * unit;
    match kind {
        NodeKind::Empty => Vec::new(),
        NodeKind::Plane => vec![FaceLayout {
            name: "plane",
            width: size.x,
            height: size.y,
            transform: Mat4::IDENTITY,
        }],
        NodeKind::Avatar => vec![FaceLayout {
            name: "avatar",
            width: size.x,
            height: size.y,
            transform: Mat4::IDENTITY,
        }],
        NodeKind::Box => cuboid_faces(size, false),
        NodeKind::Room => cuboid_faces(size, true),
    }
}

fn cuboid_faces(size: Vec3, inward: bool) -> Vec<FaceLayout> {
    // (name, width, height, orientation, distance from centre)
    let faces = [
        ("front", size.x, size.y, Mat4::IDENTITY, size.z / 2.0),
        ("back", size.x, size.y, Mat4::from_rotation_y(PI), size.z / 2.0),
        ("right", size.z, size.y, Mat4::from_rotation_y(FRAC_PI_2), size.x / 2.0),
        ("left", size.z, size.y, Mat4::from_rotation_y(-FRAC_PI_2), size.x / 2.0),
        ("top", size.x, size.z, Mat4::from_rotation_x(FRAC_PI_2), size.y / 2.0),
        ("bottom", size.x, size.z, Mat4::from_rotation_x(-FRAC_PI_2), size.y / 2.0),
    ];
    let flip = if inward { Mat4::from_rotation_y(PI) } else { Mat4::IDENTITY };
    faces
        .into_iter()
        .map(|(name, width, height, orientation, distance)| FaceLayout {
            name,
            width,
            height,
            transform: orientation * Mat4::from_translation(Vec3::new(0.0, 0.0, distance)) * flip,
        })
        .collect()
}

/// Node placement: translation in units, then YXZ euler rotation.
pub fn node_transform(position: Vec3, rotation: Vec3, unit: f32) -> Mat4 {
    Mat4::from_translation(position * unit)
        * Mat4::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z)
}

/// CSS `matrix3d(...)`. glam and CSS both store matrices column-major.
pub fn css_matrix3d(m: &Mat4) -> String {
    let mut out = String::from("matrix3d(");
    for (i, v) in m.to_cols_array().iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // Avoid "-0" in the output.
        let v = if *v == 0.0 { 0.0 } else { *v };
        let _ = write!(out, "{v}");
    }
    out.push(')');
    out
}

pub fn css_px(value: f32) -> String {
    format!("{value}px")
}
