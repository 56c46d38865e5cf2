//! Interfaces of the scene the engine runs inside.
//!
//! The host owns every persistent entity. The engine only creates, edits, and deletes entities
//! through [`ObjectStore`], finds surfaces through [`IntersectionOracle`], and asks for per-frame
//! callbacks through [`TickSource`].

use crate::geom::{Pose, Ray};
use glam::{Quat, Vec3};

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
#[display("entity#{_0}")]
pub struct EntityId(pub u64);

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
#[display("tick#{_0}")]
pub struct TickSubscription(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
	pub red: u8,
	pub green: u8,
	pub blue: u8,
}

impl Rgb {
	pub const fn new(red: u8, green: u8, blue: u8) -> Self {
		Self { red, green, blue }
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolyLineDescriptor {
	pub position: Vec3,
	pub color: Rgb,
	pub dimensions: Vec3,
	/// Seconds until the host removes the entity on its own.
	pub lifetime: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEffectDescriptor {
	pub position: Vec3,
	/// Serialized [`crate::shared::AnimationSettings`].
	pub animation_settings: String,
	pub texture: String,
	pub emit_velocity: Vec3,
	pub emit_acceleration: Vec3,
	pub velocity_spread: Vec3,
	pub emit_rate: f32,
	pub particle_radius: f32,
	pub color: Rgb,
	pub lifespan: f32,
}

/// An entity that rays can hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidDescriptor {
	pub pose: Pose,
	pub dimensions: Vec3,
	pub user_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityDescriptor {
	PolyLine(PolyLineDescriptor),
	ParticleEffect(ParticleEffectDescriptor),
	Solid(SolidDescriptor),
}

impl EntityDescriptor {
	pub fn kind(&self) -> EntityKind {
		match self {
			Self::PolyLine(_) => EntityKind::PolyLine,
			Self::ParticleEffect(_) => EntityKind::ParticleEffect,
			Self::Solid(_) => EntityKind::Solid,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum EntityKind {
	PolyLine,
	ParticleEffect,
	Solid,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyLineGeometry {
	pub line_points: Vec<Vec3>,
	pub normals: Vec<Vec3>,
	pub stroke_widths: Vec<f32>,
}

/// A partial update. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityEdit {
	pub position: Option<Vec3>,
	pub rotation: Option<Quat>,
	pub user_data: Option<String>,
	pub animation_settings: Option<String>,
	pub emit_velocity: Option<Vec3>,
	pub geometry: Option<PolyLineGeometry>,
}

impl EntityEdit {
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityProperties {
	pub kind: EntityKind,
	pub pose: Pose,
	pub dimensions: Vec3,
	pub user_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
	pub point: Vec3,
	pub entity: EntityId,
	pub properties: EntityProperties,
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum StoreError {
	#[error("{0} does not exist")]
	NotFound(EntityId),

	#[error("{id} is a {kind} and cannot take this edit")]
	UnsupportedEdit { id: EntityId, kind: EntityKind },

	#[error("malformed {property}: {message}")]
	Malformed {
		property: &'static str,
		message: String,
	},
}

static_assertions::assert_impl_all!(StoreError: std::error::Error, Send, Sync);

pub trait ObjectStore {
	fn create(&mut self, descriptor: EntityDescriptor) -> Result<EntityId, StoreError>;

	/// Merges `edit` into the entity's current properties.
	fn edit(&mut self, id: EntityId, edit: EntityEdit) -> Result<(), StoreError>;

	fn delete(&mut self, id: EntityId) -> Result<(), StoreError>;

	fn properties(&self, id: EntityId) -> Result<EntityProperties, StoreError>;
}

pub trait IntersectionOracle {
	/// Finds the nearest entity hit by `ray`, if any.
	fn cast(&self, ray: &Ray) -> Option<RayHit>;
}

pub trait TickSource {
	fn connect(&mut self) -> TickSubscription;

	/// Returns whether `subscription` was still connected.
	fn disconnect(&mut self, subscription: TickSubscription) -> bool;
}

/// Everything a spray can needs from its host.
pub trait World: ObjectStore + IntersectionOracle + TickSource {}

impl<T: ObjectStore + IntersectionOracle + TickSource> World for T {}
