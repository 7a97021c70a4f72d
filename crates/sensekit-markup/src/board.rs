//! The process-wide markup registry and its proximity queries.
//!
//! Queries are sphere- or cylinder-shaped depending on the caller's `height`,
//! and each markup is likewise a sphere (height 0) or cylinder, giving four
//! combinatorial intersection cases.  All tests run on squared distances.

use std::collections::HashMap;

use sensekit_host::SceneQuery;
use sensekit_types::{MarkupId, ObjectId, Vec2, Vec3};
use tracing::debug;

use crate::markup::{Markup, MarkupType};

/// Shape and type filter for a [`MarkupBoard`] proximity query.
#[derive(Debug, Clone)]
pub struct MarkupQuery {
    pub point: Vec3,
    pub radius: f32,
    /// 0 = spherical query; > 0 = vertical cylinder of this height.
    pub height: f32,
    /// Accepted markup types; empty accepts all.
    pub types: Vec<MarkupType>,
}

impl MarkupQuery {
    pub fn sphere(point: Vec3, radius: f32) -> Self {
        Self {
            point,
            radius,
            height: 0.0,
            types: Vec::new(),
        }
    }

    pub fn cylinder(point: Vec3, radius: f32, height: f32) -> Self {
        Self {
            height,
            ..Self::sphere(point, radius)
        }
    }

    pub fn with_types(mut self, types: Vec<MarkupType>) -> Self {
        self.types = types;
        self
    }
}

/// Registry of every active markup, keyed by id.
///
/// Markups register on activation and unregister on deactivation; queries
/// skip markups whose scene entity has been destroyed.
#[derive(Debug, Default)]
pub struct MarkupBoard {
    markups: HashMap<MarkupId, Markup>,
}

impl MarkupBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a markup to the board, returning its id.  Re-registering an id
    /// replaces the previous entry.
    pub fn register(&mut self, markup: Markup) -> MarkupId {
        let id = markup.id();
        debug!(markup = %id, kind = ?markup.markup_type(), "markup registered");
        self.markups.insert(id, markup);
        id
    }

    /// Remove a markup, returning it to the caller.
    pub fn unregister(&mut self, id: MarkupId) -> Option<Markup> {
        let removed = self.markups.remove(&id);
        if removed.is_some() {
            debug!(markup = %id, "markup unregistered");
        }
        removed
    }

    pub fn get(&self, id: MarkupId) -> Option<&Markup> {
        self.markups.get(&id)
    }

    pub fn get_mut(&mut self, id: MarkupId) -> Option<&mut Markup> {
        self.markups.get_mut(&id)
    }

    /// Find the markup anchored to a scene object.
    pub fn by_object(&self, object: ObjectId) -> Option<&Markup> {
        self.markups.values().find(|m| m.object() == object)
    }

    pub fn by_object_mut(&mut self, object: ObjectId) -> Option<&mut Markup> {
        self.markups.values_mut().find(|m| m.object() == object)
    }

    pub fn len(&self) -> usize {
        self.markups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markups.is_empty()
    }

    /// Markups intersecting the query volume.
    pub fn query(&self, scene: &dyn SceneQuery, query: &MarkupQuery) -> Vec<MarkupId> {
        self.query_where(scene, query, |_| true)
    }

    /// Markups intersecting the query volume and passing `condition`.
    pub fn query_where(
        &self,
        scene: &dyn SceneQuery,
        query: &MarkupQuery,
        condition: impl Fn(&Markup) -> bool,
    ) -> Vec<MarkupId> {
        let sensor_range = (query.height > 0.0)
            .then(|| vertical_range(query.point.y, query.height));

        let mut found = Vec::new();
        for markup in self.markups.values() {
            if !query.types.is_empty() && !query.types.contains(markup.markup_type()) {
                continue;
            }
            let Some(markup_pos) = scene.position(markup.object()) else {
                continue;
            };
            if !intersects(query, sensor_range, markup, markup_pos) {
                continue;
            }
            if condition(markup) {
                found.push(markup.id());
            }
        }
        found
    }
}

fn intersects(
    query: &MarkupQuery,
    sensor_range: Option<(f32, f32)>,
    markup: &Markup,
    markup_pos: Vec3,
) -> bool {
    match sensor_range {
        // Spherical query.
        None => {
            if markup.height() == 0.0 {
                // Sphere vs sphere (a point markup contributes no radius).
                let reach = if markup.radius() == 0.0 {
                    query.radius
                } else {
                    query.radius + markup.radius()
                };
                query.point.distance_sq(markup_pos) < reach * reach
            } else {
                // Sphere vs cylinder.
                let (lower, upper) = vertical_range(markup_pos.y, markup.height());
                intersect_sphere_cylinder(
                    query.point,
                    query.radius,
                    markup_pos,
                    markup.radius(),
                    lower,
                    upper,
                )
            }
        }
        // Cylindrical query.
        Some((sensor_lower, sensor_upper)) => {
            if markup.height() > 0.0 || markup.radius() == 0.0 {
                // Cylinder vs cylinder (points and lines are degenerate
                // cylinders).
                let (lower, upper) = vertical_range(markup_pos.y, markup.height());
                vertical_overlap(sensor_lower, sensor_upper, lower, upper)
                    && intersect_circles(
                        query.point.horizontal(),
                        query.radius,
                        markup_pos.horizontal(),
                        markup.radius(),
                    )
            } else {
                // Cylinder vs sphere: same test with the roles swapped.
                intersect_sphere_cylinder(
                    markup_pos,
                    markup.radius(),
                    query.point,
                    query.radius,
                    sensor_lower,
                    sensor_upper,
                )
            }
        }
    }
}

fn vertical_range(y: f32, height: f32) -> (f32, f32) {
    (y - height * 0.5, y + height * 0.5)
}

fn vertical_overlap(lower_a: f32, upper_a: f32, lower_b: f32, upper_b: f32) -> bool {
    lower_a.max(lower_b) <= upper_a.min(upper_b)
}

fn intersect_circles(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_sq(b) < reach * reach
}

/// Sphere vs vertical cylinder spanning `[lower, upper]`.
///
/// Reduces the sphere to its circular cross-section at the cylinder's
/// vertical span (the full radius when the span covers the sphere's center,
/// the cap-circle radius when the span only clips its top or bottom), then
/// runs a 2-D circle intersection on the horizontal plane.
fn intersect_sphere_cylinder(
    sphere_pos: Vec3,
    sphere_radius: f32,
    cylinder_pos: Vec3,
    cylinder_radius: f32,
    lower: f32,
    upper: f32,
) -> bool {
    let y = sphere_pos.y;
    let cap_radius = if (lower..=upper).contains(&y) {
        sphere_radius
    } else if (lower..=upper).contains(&(y - sphere_radius)) {
        // Span clips the bottom of the sphere.
        let h = sphere_radius - (y - upper).abs();
        (h * (2.0 * sphere_radius - h)).sqrt()
    } else if (lower..=upper).contains(&(y + sphere_radius)) {
        // Span clips the top of the sphere.
        let h = sphere_radius - (y - lower).abs();
        (h * (2.0 * sphere_radius - h)).sqrt()
    } else {
        0.0
    };

    if cap_radius == 0.0 {
        return false;
    }
    intersect_circles(
        sphere_pos.horizontal(),
        cap_radius,
        cylinder_pos.horizontal(),
        cylinder_radius,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::MarkupParams;
    use sensekit_host::SimWorld;

    fn board_with(
        world: &mut SimWorld,
        entries: &[(Vec3, &str, f32, f32)],
    ) -> (MarkupBoard, Vec<MarkupId>) {
        let mut board = MarkupBoard::new();
        let mut ids = Vec::new();
        for (pos, kind, radius, height) in entries {
            let object = world.spawn(*pos);
            let markup = Markup::new(
                object,
                MarkupParams::new(MarkupType::new(*kind))
                    .with_radius(*radius)
                    .with_height(*height),
            );
            ids.push(board.register(markup));
        }
        (board, ids)
    }

    #[test]
    fn sphere_query_hits_point_markups_in_range() {
        let mut world = SimWorld::new();
        let (board, ids) = board_with(
            &mut world,
            &[
                (Vec3::new(2.0, 0.0, 0.0), "cover", 0.0, 0.0),
                (Vec3::new(50.0, 0.0, 0.0), "cover", 0.0, 0.0),
            ],
        );
        let hits = board.query(&world, &MarkupQuery::sphere(Vec3::ZERO, 5.0));
        assert_eq!(hits, vec![ids[0]]);
    }

    #[test]
    fn sphere_query_adds_markup_radius() {
        let mut world = SimWorld::new();
        // Center 6 away, own radius 2: reachable by a 5-radius query.
        let (board, _) = board_with(&mut world, &[(Vec3::new(6.0, 0.0, 0.0), "cover", 2.0, 0.0)]);
        assert_eq!(board.query(&world, &MarkupQuery::sphere(Vec3::ZERO, 5.0)).len(), 1);
        assert!(board.query(&world, &MarkupQuery::sphere(Vec3::ZERO, 3.0)).is_empty());
    }

    #[test]
    fn type_filter_limits_results() {
        let mut world = SimWorld::new();
        let (board, ids) = board_with(
            &mut world,
            &[
                (Vec3::new(1.0, 0.0, 0.0), "cover", 0.0, 0.0),
                (Vec3::new(2.0, 0.0, 0.0), "patrol", 0.0, 0.0),
            ],
        );
        let query = MarkupQuery::sphere(Vec3::ZERO, 5.0).with_types(vec![MarkupType::new("patrol")]);
        assert_eq!(board.query(&world, &query), vec![ids[1]]);
    }

    #[test]
    fn condition_filters_occupied_markups() {
        let mut world = SimWorld::new();
        let (mut board, ids) = board_with(
            &mut world,
            &[
                (Vec3::new(1.0, 0.0, 0.0), "cover", 0.0, 0.0),
                (Vec3::new(2.0, 0.0, 0.0), "cover", 0.0, 0.0),
            ],
        );
        board.get_mut(ids[0]).unwrap().arrive(ObjectId::new());

        let query = MarkupQuery::sphere(Vec3::ZERO, 5.0);
        let vacant = board.query_where(&world, &query, Markup::vacant);
        assert_eq!(vacant, vec![ids[1]]);
    }

    #[test]
    fn sphere_vs_cylinder_respects_vertical_span() {
        let mut world = SimWorld::new();
        // Tall thin cylinder 3 away horizontally, spanning y in [-5, 5].
        let (board, _) = board_with(&mut world, &[(Vec3::new(3.0, 0.0, 0.0), "pillar", 1.0, 10.0)]);

        // Sphere at the same height reaches it: cap radius 2.5 + 1.0 > 3.0.
        let level = MarkupQuery::sphere(Vec3::ZERO, 2.5);
        assert_eq!(board.query(&world, &level).len(), 1);

        // Sphere far above the span cannot touch it.
        let above = MarkupQuery::sphere(Vec3::new(0.0, 20.0, 0.0), 2.5);
        assert!(board.query(&world, &above).is_empty());
    }

    #[test]
    fn sphere_vs_cylinder_cap_shrinks_near_the_rim() {
        let mut world = SimWorld::new();
        // Cylinder spans y in [-1, 1]; sphere center sits at y = 2.5 with
        // radius 2, so only its bottom cap (height 0.5) is in the span:
        // cap radius = sqrt(0.5 * (4 - 0.5)) ≈ 1.32.
        let (board, _) = board_with(&mut world, &[(Vec3::new(2.0, 0.0, 0.0), "pillar", 0.5, 2.0)]);

        let near = MarkupQuery::sphere(Vec3::new(0.0, 2.5, 0.0), 2.0);
        // 1.32 + 0.5 < 2.0 horizontal distance: no intersection.
        assert!(board.query(&world, &near).is_empty());

        // Same sphere, cylinder moved closer: 1.32 + 0.5 > 1.5.
        let mut world2 = SimWorld::new();
        let (board2, _) =
            board_with(&mut world2, &[(Vec3::new(1.5, 0.0, 0.0), "pillar", 0.5, 2.0)]);
        assert_eq!(board2.query(&world2, &near).len(), 1);
    }

    #[test]
    fn cylinder_query_against_cylinder_and_point() {
        let mut world = SimWorld::new();
        let (board, ids) = board_with(
            &mut world,
            &[
                // Overlapping vertical span, close horizontally.
                (Vec3::new(2.0, 1.0, 0.0), "pillar", 1.0, 4.0),
                // Disjoint vertical span.
                (Vec3::new(2.0, 30.0, 0.0), "pillar", 1.0, 4.0),
                // Point markup inside the query cylinder.
                (Vec3::new(0.5, 0.5, 0.0), "point", 0.0, 0.0),
            ],
        );
        let query = MarkupQuery::cylinder(Vec3::ZERO, 2.0, 4.0);
        let mut hits = board.query(&world, &query);
        hits.sort();
        let mut expected = vec![ids[0], ids[2]];
        expected.sort();
        assert_eq!(hits, expected);
    }

    #[test]
    fn cylinder_query_against_sphere_swaps_roles() {
        let mut world = SimWorld::new();
        // Sphere markup at the query cylinder's height.
        let (board, _) = board_with(&mut world, &[(Vec3::new(2.5, 0.0, 0.0), "orb", 1.0, 0.0)]);
        let query = MarkupQuery::cylinder(Vec3::ZERO, 2.0, 6.0);
        assert_eq!(board.query(&world, &query).len(), 1);

        // Same sphere far above the span.
        let mut world2 = SimWorld::new();
        let (board2, _) = board_with(&mut world2, &[(Vec3::new(2.5, 30.0, 0.0), "orb", 1.0, 0.0)]);
        assert!(board2.query(&world2, &query).is_empty());
    }

    #[test]
    fn destroyed_markup_objects_are_skipped() {
        let mut world = SimWorld::new();
        let object = world.spawn(Vec3::new(1.0, 0.0, 0.0));
        let mut board = MarkupBoard::new();
        board.register(Markup::new(
            object,
            MarkupParams::new(MarkupType::new("cover")),
        ));
        world.destroy(object);
        assert!(board.query(&world, &MarkupQuery::sphere(Vec3::ZERO, 5.0)).is_empty());
    }

    #[test]
    fn by_object_finds_registered_markup() {
        let mut world = SimWorld::new();
        let object = world.spawn(Vec3::ZERO);
        let mut board = MarkupBoard::new();
        let id = board.register(Markup::new(
            object,
            MarkupParams::new(MarkupType::new("cover")),
        ));
        assert_eq!(board.by_object(object).map(Markup::id), Some(id));
        board.unregister(id);
        assert!(board.by_object(object).is_none());
    }
}
