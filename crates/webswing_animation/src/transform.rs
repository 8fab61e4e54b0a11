//! Transform state written to a target element
//!
//! A [`TransformState`] is the pure output of sampling: every property is
//! optional, and only the properties that are set are applied by the view
//! layer. Composition merges states property by property.

use std::fmt;

/// Animatable property of a target element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    /// Horizontal translation in pixels
    X,
    /// Vertical translation in pixels
    Y,
    /// Rotation in degrees (Z-axis)
    Rotation,
    /// Rotation Y in degrees (3D turn)
    RotationY,
    /// Uniform scale factor
    Scale,
    /// Opacity (0.0 to 1.0)
    Opacity,
    /// Secondary rotation offset in degrees, added to `Rotation`
    Swing,
    /// Vertical translation as a percentage of the element height
    YPercent,
}

impl Property {
    pub const ALL: [Property; 8] = [
        Property::X,
        Property::Y,
        Property::Rotation,
        Property::RotationY,
        Property::Scale,
        Property::Opacity,
        Property::Swing,
        Property::YPercent,
    ];

    /// Name as written in scene files (`x`, `rotationY`, `yPercent`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Property::X => "x",
            Property::Y => "y",
            Property::Rotation => "rotation",
            Property::RotationY => "rotationY",
            Property::Scale => "scale",
            Property::Opacity => "opacity",
            Property::Swing => "swing",
            Property::YPercent => "yPercent",
        }
    }

    /// Look a property up by its scene-file name, case-insensitively
    pub fn from_name(name: &str) -> Option<Property> {
        Property::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A small set of properties
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropertySet(u8);

impl PropertySet {
    pub const EMPTY: PropertySet = PropertySet(0);

    pub fn insert(&mut self, property: Property) {
        self.0 |= property.bit();
    }

    pub fn with(mut self, property: Property) -> Self {
        self.insert(property);
        self
    }

    pub fn contains(&self, property: Property) -> bool {
        self.0 & property.bit() != 0
    }

    pub fn intersects(&self, other: PropertySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Property> + '_ {
        Property::ALL.into_iter().filter(|p| self.contains(*p))
    }
}

impl FromIterator<Property> for PropertySet {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut set = PropertySet::EMPTY;
        for p in iter {
            set.insert(p);
        }
        set
    }
}

/// Resolved transform for one target
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformState {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub rotation: Option<f32>,
    pub rotation_y: Option<f32>,
    pub scale: Option<f32>,
    pub opacity: Option<f32>,
    pub swing: Option<f32>,
    pub y_percent: Option<f32>,
}

impl TransformState {
    /// Create state with only translation set
    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// Create state with only opacity set
    pub fn opacity(value: f32) -> Self {
        Self {
            opacity: Some(value),
            ..Default::default()
        }
    }

    /// Builder: set one property
    pub fn with(mut self, property: Property, value: f32) -> Self {
        self.set(property, value);
        self
    }

    pub fn get(&self, property: Property) -> Option<f32> {
        match property {
            Property::X => self.x,
            Property::Y => self.y,
            Property::Rotation => self.rotation,
            Property::RotationY => self.rotation_y,
            Property::Scale => self.scale,
            Property::Opacity => self.opacity,
            Property::Swing => self.swing,
            Property::YPercent => self.y_percent,
        }
    }

    pub fn set(&mut self, property: Property, value: f32) {
        *self.slot(property) = Some(value);
    }

    pub fn clear(&mut self, property: Property) {
        *self.slot(property) = None;
    }

    fn slot(&mut self, property: Property) -> &mut Option<f32> {
        match property {
            Property::X => &mut self.x,
            Property::Y => &mut self.y,
            Property::Rotation => &mut self.rotation,
            Property::RotationY => &mut self.rotation_y,
            Property::Scale => &mut self.scale,
            Property::Opacity => &mut self.opacity,
            Property::Swing => &mut self.swing,
            Property::YPercent => &mut self.y_percent,
        }
    }

    /// Iterate over the properties that are set
    pub fn iter(&self) -> impl Iterator<Item = (Property, f32)> + '_ {
        Property::ALL
            .into_iter()
            .filter_map(|p| self.get(p).map(|v| (p, v)))
    }

    pub fn properties(&self) -> PropertySet {
        self.iter().map(|(p, _)| p).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether every set property holds a finite value
    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, v)| v.is_finite())
    }

    /// Overwrite with every property that `other` sets
    pub fn merge(&mut self, other: &TransformState) {
        for (p, v) in other.iter() {
            self.set(p, v);
        }
    }

    /// Overwrite with the properties of `other` that are not in `skip`
    pub fn merge_except(&mut self, other: &TransformState, skip: PropertySet) {
        for (p, v) in other.iter().filter(|(p, _)| !skip.contains(*p)) {
            self.set(p, v);
        }
    }

    // ========================================================================
    // Resolved values for the view layer
    // ========================================================================

    /// Primary rotation plus the swing offset
    pub fn resolved_rotation(&self) -> f32 {
        self.rotation.unwrap_or(0.0) + self.swing.unwrap_or(0.0)
    }

    pub fn resolved_scale(&self) -> f32 {
        self.scale.unwrap_or(1.0)
    }

    pub fn resolved_opacity(&self) -> f32 {
        self.opacity.unwrap_or(1.0)
    }
}
