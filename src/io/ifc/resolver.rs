//! Relationship resolvers over the STEP entity graph
//!
//! Each resolver follows one fixed chain of references: object placement,
//! extruded body profile, or the project length unit. A missing or mistyped
//! link anywhere in a chain yields `None`.

use indexmap::IndexMap;
use nalgebra::{Matrix4, Vector3, Vector4};

use super::step::{StepEntity, StepValue};
use crate::geometry::signed_area;
use crate::io::INCHES_PER_METRE;
use crate::types::Point;

/// Deepest `PlacementRelTo` chain followed
const MAX_PLACEMENT_DEPTH: usize = 32;

/// Product arguments shared by walls, doors, windows and spaces
pub(crate) const ARG_NAME: usize = 2;
pub(crate) const ARG_PLACEMENT: usize = 5;
pub(crate) const ARG_REPRESENTATION: usize = 6;

/// Where a product sits on the plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placement {
    pub origin: Point,
    pub elevation: f64,
    /// Direction of the local x axis, radians
    pub angle: f64,
}

/// Outline of an extruded body
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Profile {
    /// Centered on `center` in the solid's local frame
    Rectangle { x_dim: f64, y_dim: f64, center: Point },
    Polygon(Vec<Point>),
}

impl Profile {
    pub fn area(&self) -> f64 {
        match self {
            Self::Rectangle { x_dim, y_dim, .. } => x_dim * y_dim,
            Self::Polygon(points) => signed_area(points).abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Extrusion {
    pub profile: Profile,
    pub depth: f64,
}

/// Entities by instance id
#[derive(Debug, Default)]
pub(crate) struct EntityGraph {
    entities: IndexMap<u64, StepEntity>,
}

impl EntityGraph {
    pub fn new(entities: Vec<StepEntity>) -> Self {
        Self {
            entities: entities.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn get(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    fn typed(&self, id: u64, type_name: &str) -> Option<&StepEntity> {
        self.get(id).filter(|e| e.type_name == type_name)
    }

    pub fn of_type<'g>(&'g self, type_name: &'g str) -> impl Iterator<Item = &'g StepEntity> + 'g {
        self.entities.values().filter(move |e| e.type_name == type_name)
    }

    /// Instance count per type name, in first-seen order
    pub fn type_counts(&self) -> IndexMap<&str, usize> {
        let mut counts = IndexMap::new();
        for entity in self.entities.values() {
            *counts.entry(entity.type_name.as_str()).or_insert(0) += 1;
        }
        counts
    }

    fn coordinates(&self, id: u64, type_name: &str) -> Option<Vector3<f64>> {
        let entity = self.typed(id, type_name)?;
        let coords: Vec<f64> = entity
            .arg(0)?
            .as_list()?
            .iter()
            .filter_map(StepValue::as_f64)
            .collect();
        match coords.as_slice() {
            [x, y] => Some(Vector3::new(*x, *y, 0.0)),
            [x, y, z, ..] => Some(Vector3::new(*x, *y, *z)),
            _ => None,
        }
    }

    pub fn cartesian_point(&self, id: u64) -> Option<Vector3<f64>> {
        self.coordinates(id, "IFCCARTESIANPOINT")
    }

    fn direction(&self, id: Option<u64>) -> Option<Vector3<f64>> {
        let v = self.coordinates(id?, "IFCDIRECTION")?;
        (v.norm() > 1e-12).then(|| v.normalize())
    }

    /// Frame of an `IFCAXIS2PLACEMENT3D` or `IFCAXIS2PLACEMENT2D`
    fn axis_placement(&self, id: u64) -> Option<Matrix4<f64>> {
        let entity = self.get(id)?;
        let (z, x) = match entity.type_name.as_str() {
            "IFCAXIS2PLACEMENT3D" => (
                self.direction(entity.ref_arg(1)).unwrap_or_else(Vector3::z),
                self.direction(entity.ref_arg(2)).unwrap_or_else(Vector3::x),
            ),
            "IFCAXIS2PLACEMENT2D" => (
                Vector3::z(),
                self.direction(entity.ref_arg(1)).unwrap_or_else(Vector3::x),
            ),
            _ => return None,
        };
        let location = self.cartesian_point(entity.ref_arg(0)?)?;

        // x projected into the plane normal to z
        let x = x - z * x.dot(&z);
        let x = if x.norm() > 1e-12 { x.normalize() } else { Vector3::x() };
        let y = z.cross(&x);
        Some(Matrix4::new(
            x.x, y.x, z.x, location.x,
            x.y, y.y, z.y, location.y,
            x.z, y.z, z.z, location.z,
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// World transform of an `IFCLOCALPLACEMENT`, composed through `PlacementRelTo`
    pub fn local_placement(&self, id: u64) -> Option<Matrix4<f64>> {
        self.local_placement_at(id, 0)
    }

    fn local_placement_at(&self, id: u64, depth: usize) -> Option<Matrix4<f64>> {
        if depth > MAX_PLACEMENT_DEPTH {
            return None;
        }
        let entity = self.typed(id, "IFCLOCALPLACEMENT")?;
        let local = self.axis_placement(entity.ref_arg(1)?)?;
        match entity.ref_arg(0) {
            Some(parent) => Some(self.local_placement_at(parent, depth + 1)? * local),
            None => Some(local),
        }
    }

    /// Plan placement of a product through its `ObjectPlacement`
    pub fn product_placement(&self, product: &StepEntity, unit_scale: f64) -> Option<Placement> {
        let world = self.local_placement(product.ref_arg(ARG_PLACEMENT)?)?;
        let origin = world * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let axis = world * Vector4::new(1.0, 0.0, 0.0, 0.0);
        Some(Placement {
            origin: Point::new(origin.x * unit_scale, origin.y * unit_scale),
            elevation: origin.z * unit_scale,
            angle: axis.y.atan2(axis.x),
        })
    }

    /// First extruded solid of a product's representation
    ///
    /// Follows `ProductDefinitionShape → ShapeRepresentation →
    /// ExtrudedAreaSolid → profile`. Dimensions are in file units.
    pub fn extrusion(&self, product: &StepEntity) -> Option<Extrusion> {
        let shape = self.typed(product.ref_arg(ARG_REPRESENTATION)?, "IFCPRODUCTDEFINITIONSHAPE")?;
        shape
            .ref_list(2)
            .into_iter()
            .filter_map(|id| self.typed(id, "IFCSHAPEREPRESENTATION"))
            .flat_map(|rep| rep.ref_list(3))
            .filter_map(|id| self.typed(id, "IFCEXTRUDEDAREASOLID"))
            .find_map(|solid| {
                let profile = self.profile(solid.ref_arg(0)?)?;
                let depth = solid.f64_arg(3)?;
                Some(Extrusion { profile, depth })
            })
    }

    fn profile(&self, id: u64) -> Option<Profile> {
        let entity = self.get(id)?;
        match entity.type_name.as_str() {
            "IFCRECTANGLEPROFILEDEF" => {
                let center = entity
                    .ref_arg(2)
                    .and_then(|id| self.axis_placement(id))
                    .map(|m| Point::new(m[(0, 3)], m[(1, 3)]))
                    .unwrap_or(Point::ZERO);
                Some(Profile::Rectangle {
                    x_dim: entity.f64_arg(3)?,
                    y_dim: entity.f64_arg(4)?,
                    center,
                })
            }
            "IFCARBITRARYCLOSEDPROFILEDEF" => {
                let curve = self.typed(entity.ref_arg(2)?, "IFCPOLYLINE")?;
                let points: Vec<Point> = curve
                    .ref_list(0)
                    .into_iter()
                    .filter_map(|p| self.cartesian_point(p))
                    .map(|v| Point::new(v.x, v.y))
                    .collect();
                (points.len() >= 3).then_some(Profile::Polygon(points))
            }
            _ => None,
        }
    }

    /// Inches per file length unit, from the project unit assignment
    pub fn length_unit_inches(&self) -> Option<f64> {
        self.of_type("IFCUNITASSIGNMENT")
            .flat_map(|assignment| assignment.ref_list(0))
            .find_map(|unit| self.length_unit(unit, 0))
    }

    fn length_unit(&self, id: u64, depth: usize) -> Option<f64> {
        let unit = self.get(id)?;
        if depth > 4 || unit.enum_arg(1) != Some("LENGTHUNIT") {
            return None;
        }
        match unit.type_name.as_str() {
            "IFCSIUNIT" => {
                if unit.enum_arg(3) != Some("METRE") {
                    return None;
                }
                let prefix = match unit.enum_arg(2) {
                    None => 1.0,
                    Some("MILLI") => 1e-3,
                    Some("CENTI") => 1e-2,
                    Some("DECI") => 1e-1,
                    Some("KILO") => 1e3,
                    Some(_) => return None,
                };
                Some(prefix * INCHES_PER_METRE)
            }
            "IFCCONVERSIONBASEDUNIT" => {
                match unit.str_arg(2).map(str::to_ascii_lowercase).as_deref() {
                    Some("inch") | Some("inches") => return Some(1.0),
                    Some("foot") | Some("feet") => return Some(12.0),
                    _ => {}
                }
                let measure = self.typed(unit.ref_arg(3)?, "IFCMEASUREWITHUNIT")?;
                Some(measure.f64_arg(0)? * self.length_unit(measure.ref_arg(1)?, depth + 1)?)
            }
            _ => None,
        }
    }
}
