//! Collision detection and response for axis-aligned geometry
//!
//! The ball is a circle; the paddle, bricks and playfield walls are
//! axis-aligned rectangles or half-planes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Point inside (or on) the rectangle nearest to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.x, self.x + self.w),
            p.y.clamp(self.y, self.y + self.h),
        )
    }

    /// Circle-vs-rectangle overlap (touching counts)
    #[inline]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        center.distance_squared(self.closest_point(center)) <= radius * radius
    }
}

/// Contact between the ball and a wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Surface normal pointing back into the playfield
    pub normal: Vec2,
    /// How far the ball has crossed the boundary
    pub penetration: f32,
}

/// Check the ball against the left, right and top walls.
///
/// The bottom of the playfield is open. At most one vertical and one
/// horizontal wall can be touched at a time, so up to two contacts come back.
pub fn wall_contacts(pos: Vec2, radius: f32, field_width: f32) -> [Option<Contact>; 2] {
    let horizontal = if pos.x < radius {
        Some(Contact {
            normal: Vec2::X,
            penetration: radius - pos.x,
        })
    } else if pos.x > field_width - radius {
        Some(Contact {
            normal: Vec2::NEG_X,
            penetration: pos.x - (field_width - radius),
        })
    } else {
        None
    };

    let top = (pos.y < radius).then(|| Contact {
        normal: Vec2::Y,
        penetration: radius - pos.y,
    });

    [horizontal, top]
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Push the ball out of a wall and reflect it if it is still heading in.
///
/// Reflecting only while moving into the wall keeps one sign flip per
/// crossing even if the ball lingers at the boundary.
pub fn resolve_contact(pos: &mut Vec2, vel: &mut Vec2, contact: &Contact) {
    *pos += contact.normal * contact.penetration;
    if vel.dot(contact.normal) < 0.0 {
        *vel = reflect_velocity(*vel, contact.normal);
    }
}

/// Contact offset of `x` from the paddle center, normalized to [-1, 1]
#[inline]
pub fn paddle_offset(x: f32, paddle: &Rect) -> f32 {
    let half = paddle.w / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    ((x - (paddle.x + half)) / half).clamp(-1.0, 1.0)
}
