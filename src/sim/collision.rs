//! Collision detection and response
//!
//! Circles against circles, walls and segments. Ball-ball response is an
//! equal-mass elastic exchange along the contact normal, followed by
//! positional separation.

use glam::Vec2;

use super::events::{DamageSource, GameEvent, strike};
use super::state::{ArenaState, Ball, Rect};
use crate::Settings;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Unit normal from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Circle-circle overlap test (touching does not count)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}

/// Circle-circle contact with normal from `a` to `b`
///
/// Coincident centers have no defined normal and are reported as a miss.
pub fn circle_circle_collision(a: Vec2, ra: f32, b: Vec2, rb: f32) -> CollisionResult {
    let delta = b - a;
    let dist = delta.length();
    let reach = ra + rb;
    if dist >= reach || dist <= f32::EPSILON {
        return CollisionResult::miss();
    }
    let normal = delta / dist;
    CollisionResult {
        hit: true,
        point: a + normal * ra,
        normal,
        penetration: reach - dist,
    }
}

/// Inclusive point-in-rectangle test
#[inline]
pub fn point_in_rect(p: Vec2, rect: &Rect) -> bool {
    p.x >= rect.min.x && p.x <= rect.max.x && p.y >= rect.min.y && p.y <= rect.max.y
}

/// Closest point to `p` on the segment `a..b`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a; // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Does a circle touch the segment `a..b`
pub fn circle_segment_overlap(center: Vec2, radius: f32, a: Vec2, b: Vec2) -> bool {
    closest_point_on_segment(center, a, b).distance_squared(center) <= radius * radius
}

/// Keep a ball inside the arena, bouncing with no energy loss
///
/// Returns true if a wall was touched.
pub fn bounce_off_walls(ball: &mut Ball, bounds: &Rect) -> bool {
    let mut hit = false;
    let r = ball.radius;
    if ball.pos.x - r < bounds.min.x {
        ball.pos.x = bounds.min.x + r;
        ball.vel.x = ball.vel.x.abs();
        hit = true;
    } else if ball.pos.x + r > bounds.max.x {
        ball.pos.x = bounds.max.x - r;
        ball.vel.x = -ball.vel.x.abs();
        hit = true;
    }
    if ball.pos.y - r < bounds.min.y {
        ball.pos.y = bounds.min.y + r;
        ball.vel.y = ball.vel.y.abs();
        hit = true;
    } else if ball.pos.y + r > bounds.max.y {
        ball.pos.y = bounds.max.y - r;
        ball.vel.y = -ball.vel.y.abs();
        hit = true;
    }
    hit
}

/// Equal-mass elastic exchange of the normal velocity components
///
/// `normal` points from `a` to `b`. Pairs already separating are left alone.
pub fn resolve_elastic(a: &mut Ball, b: &mut Ball, normal: Vec2) {
    let impulse = a.vel.dot(normal) - b.vel.dot(normal);
    if impulse <= 0.0 {
        return;
    }
    a.vel -= normal * impulse;
    b.vel += normal * impulse;
}

/// Push overlapping balls apart, half the penetration each
pub fn separate(a: &mut Ball, b: &mut Ball, normal: Vec2, penetration: f32) {
    let push = normal * (penetration * 0.5);
    a.pos -= push;
    b.pos += push;
}

/// Hand a share of the speed differential from the faster ball to the slower one
///
/// Both balls keep their direction of travel. A stationary slower ball is
/// pushed away from the faster one along `normal` (a to b).
pub fn transfer_speed(a: &mut Ball, b: &mut Ball, normal: Vec2, fraction: f32) {
    let (sa, sb) = (a.vel.length(), b.vel.length());
    let (fast, slow, away) = if sa >= sb { (a, b, normal) } else { (b, a, -normal) };
    let (sf, ss) = (fast.vel.length(), slow.vel.length());
    let delta = (sf - ss) * fraction;
    if delta <= 0.0 {
        return;
    }
    fast.vel = fast.vel.normalize_or_zero() * (sf - delta);
    slow.vel = slow.vel.normalize_or(away) * (ss + delta);
}

/// Borrow two distinct balls mutably (`i < j`)
pub(crate) fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> (&mut Ball, &mut Ball) {
    debug_assert!(i < j);
    let (head, tail) = balls.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Resolve every overlapping pair of living balls
///
/// Contact damage is symmetric and limited to one exchange per pair per
/// `settings.contact_cooldown`.
pub fn resolve_ball_collisions(
    state: &mut ArenaState,
    settings: &Settings,
    events: &mut Vec<GameEvent>,
) {
    let now = state.elapsed;
    let n = state.balls.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = pair_mut(&mut state.balls, i, j);
            if !a.is_alive() || !b.is_alive() {
                continue;
            }
            let contact = circle_circle_collision(a.pos, a.radius, b.pos, b.radius);
            if !contact.hit {
                continue;
            }

            resolve_elastic(a, b, contact.normal);
            if settings.speed_transfer() {
                transfer_speed(a, b, contact.normal, settings.speed_transfer_fraction);
            }
            separate(a, b, contact.normal, contact.penetration);
            events.push(GameEvent::BallCollision { a: a.id, b: b.id });

            let key = (a.id.min(b.id), a.id.max(b.id));
            let ready = state
                .contact_hits
                .get(&key)
                .is_none_or(|&last| now - last >= settings.contact_cooldown);
            if !ready {
                continue;
            }
            state.contact_hits.insert(key, now);

            // Both hits land before either defeat is considered
            let (dmg_a, dmg_b) = (a.contact_damage(), b.contact_damage());
            strike(b, dmg_a, DamageSource::Contact(a.id), events);
            strike(a, dmg_b, DamageSource::Contact(b.id), events);
        }
    }
}
