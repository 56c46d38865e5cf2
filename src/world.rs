//! A self-contained scene that implements every host interface in memory.
//!
//! Useful for running a spray can without a real host, and for tests.

use crate::geom::{self, Pose, Ray};
use crate::host::*;
use crate::shared::{AnimationSettings, GrabKey, UserData};
use glam::Vec3;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	Create(EntityId, EntityKind),
	Edit(EntityId),
	Delete(EntityId),
	Expire(EntityId),
}

#[derive(Debug, Clone)]
pub struct Entity {
	/// What the entity was created from. Later edits are reflected in the other fields only.
	pub descriptor: EntityDescriptor,
	pub pose: Pose,
	pub dimensions: Vec3,
	pub user_data: Option<String>,
	pub animation_settings: Option<AnimationSettings>,
	pub emit_velocity: Vec3,
	pub geometry: PolyLineGeometry,
	pub age: f32,
	pub lifetime: Option<f32>,
}

impl Entity {
	fn blank(descriptor: EntityDescriptor) -> Self {
		Self {
			descriptor,
			pose: Pose::default(),
			dimensions: Vec3::ONE,
			user_data: None,
			animation_settings: None,
			emit_velocity: Vec3::ZERO,
			geometry: PolyLineGeometry::default(),
			age: 0.0,
			lifetime: None,
		}
	}

	fn new(descriptor: EntityDescriptor) -> Result<Self, StoreError> {
		let mut entity = Self::blank(descriptor.clone());
		match descriptor {
			EntityDescriptor::PolyLine(d) => {
				entity.pose.position = d.position;
				entity.dimensions = d.dimensions;
				entity.lifetime = d.lifetime;
			}
			EntityDescriptor::ParticleEffect(d) => {
				entity.pose.position = d.position;
				entity.emit_velocity = d.emit_velocity;
				entity.animation_settings = Some(parse_animation_settings(&d.animation_settings)?);
			}
			EntityDescriptor::Solid(d) => {
				entity.pose = d.pose;
				entity.dimensions = d.dimensions;
				entity.user_data = d.user_data;
			}
		}
		Ok(entity)
	}

	pub fn kind(&self) -> EntityKind {
		self.descriptor.kind()
	}

	fn properties(&self) -> EntityProperties {
		EntityProperties {
			kind: self.kind(),
			pose: self.pose,
			dimensions: self.dimensions,
			user_data: self.user_data.clone(),
		}
	}
}

fn parse_animation_settings(json: &str) -> Result<AnimationSettings, StoreError> {
	AnimationSettings::parse(json).map_err(|error| StoreError::Malformed {
		property: "animationSettings",
		message: error.to_string(),
	})
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
	entities: BTreeMap<EntityId, Entity>,
	next_entity: u64,
	subscriptions: BTreeSet<TickSubscription>,
	next_subscription: u64,
	log: Vec<Operation>,
}

impl MemoryWorld {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn entity(&self, id: EntityId) -> Option<&Entity> {
		self.entities.get(&id)
	}

	pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
		self.entities.iter().map(|(&id, entity)| (id, entity))
	}

	pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
		self
			.entities()
			.filter(move |(_, entity)| entity.kind() == kind)
			.map(|(id, _)| id)
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	pub fn geometry(&self, id: EntityId) -> Option<&PolyLineGeometry> {
		self.entity(id).map(|entity| &entity.geometry)
	}

	pub fn animation_settings(&self, id: EntityId) -> Option<&AnimationSettings> {
		self.entity(id)?.animation_settings.as_ref()
	}

	pub fn log(&self) -> &[Operation] {
		&self.log
	}

	pub fn edit_count(&self) -> usize {
		self
			.log
			.iter()
			.filter(|op| matches!(op, Operation::Edit(_)))
			.count()
	}

	/// Number of delete requests for `id`, including ones that failed.
	pub fn delete_count(&self, id: EntityId) -> usize {
		self
			.log
			.iter()
			.filter(|op| **op == Operation::Delete(id))
			.count()
	}

	pub fn is_connected(&self, subscription: TickSubscription) -> bool {
		self.subscriptions.contains(&subscription)
	}

	pub fn subscriptions(&self) -> impl Iterator<Item = TickSubscription> + '_ {
		self.subscriptions.iter().copied()
	}

	pub fn spawn_solid(&mut self, pose: Pose, dimensions: Vec3) -> EntityId {
		let descriptor = EntityDescriptor::Solid(SolidDescriptor {
			pose,
			dimensions,
			user_data: None,
		});
		self.insert(Entity {
			pose,
			dimensions,
			..Entity::blank(descriptor)
		})
	}

	pub fn set_pose(&mut self, id: EntityId, pose: Pose) -> Result<(), StoreError> {
		self.edit(
			id,
			EntityEdit {
				position: Some(pose.position),
				rotation: Some(pose.rotation),
				..Default::default()
			},
		)
	}

	/// Writes `grab` into the entity's user data the way a grabbing participant would.
	pub fn set_grab(&mut self, id: EntityId, grab: GrabKey) -> Result<(), StoreError> {
		let user_data = UserData {
			grab_key: Some(grab),
		};
		self.edit(
			id,
			EntityEdit {
				user_data: Some(user_data.to_json()),
				..Default::default()
			},
		)
	}

	/// Ages every entity by `delta_time` and removes the ones past their lifetime.
	pub fn advance(&mut self, delta_time: f32) -> Vec<EntityId> {
		let mut expired = Vec::new();
		for (&id, entity) in self.entities.iter_mut() {
			entity.age += delta_time;
			if entity.lifetime.is_some_and(|lifetime| entity.age >= lifetime) {
				expired.push(id);
			}
		}
		for &id in &expired {
			self.entities.remove(&id);
			self.log.push(Operation::Expire(id));
			tracing::debug!(%id, "entity expired");
		}
		expired
	}

	fn insert(&mut self, entity: Entity) -> EntityId {
		self.next_entity += 1;
		let id = EntityId(self.next_entity);
		self.log.push(Operation::Create(id, entity.kind()));
		self.entities.insert(id, entity);
		id
	}
}

impl ObjectStore for MemoryWorld {
	fn create(&mut self, descriptor: EntityDescriptor) -> Result<EntityId, StoreError> {
		let entity = Entity::new(descriptor)?;
		Ok(self.insert(entity))
	}

	fn edit(&mut self, id: EntityId, edit: EntityEdit) -> Result<(), StoreError> {
		let entity = self.entities.get_mut(&id).ok_or(StoreError::NotFound(id))?;
		let kind = entity.kind();
		let unsupported = || StoreError::UnsupportedEdit { id, kind };
		if edit.is_empty() {
			return Ok(());
		}

		// Validate everything before touching the entity so an edit applies entirely or not at all.
		let animation_settings = match &edit.animation_settings {
			Some(_) if kind != EntityKind::ParticleEffect => return Err(unsupported()),
			Some(json) => Some(parse_animation_settings(json)?),
			None => None,
		};
		if edit.emit_velocity.is_some() && kind != EntityKind::ParticleEffect {
			return Err(unsupported());
		}
		if edit.geometry.is_some() && kind != EntityKind::PolyLine {
			return Err(unsupported());
		}

		if let Some(position) = edit.position {
			entity.pose.position = position;
		}
		if let Some(rotation) = edit.rotation {
			entity.pose.rotation = rotation;
		}
		if let Some(user_data) = edit.user_data {
			entity.user_data = Some(user_data);
		}
		if let Some(patch) = animation_settings {
			entity
				.animation_settings
				.get_or_insert_with(Default::default)
				.merge(&patch);
		}
		if let Some(emit_velocity) = edit.emit_velocity {
			entity.emit_velocity = emit_velocity;
		}
		if let Some(geometry) = edit.geometry {
			entity.geometry = geometry;
		}
		self.log.push(Operation::Edit(id));
		Ok(())
	}

	fn delete(&mut self, id: EntityId) -> Result<(), StoreError> {
		self.log.push(Operation::Delete(id));
		self
			.entities
			.remove(&id)
			.map(|_| ())
			.ok_or(StoreError::NotFound(id))
	}

	fn properties(&self, id: EntityId) -> Result<EntityProperties, StoreError> {
		self
			.entity(id)
			.map(Entity::properties)
			.ok_or(StoreError::NotFound(id))
	}
}

impl IntersectionOracle for MemoryWorld {
	fn cast(&self, ray: &Ray) -> Option<RayHit> {
		let (id, entity, t) = self
			.entities()
			.filter(|(_, entity)| entity.kind() == EntityKind::Solid)
			.filter_map(|(id, entity)| {
				let t = geom::ray_hits_oriented_box(ray, &entity.pose, entity.dimensions)?;
				Some((id, entity, t))
			})
			.min_by_key(|(_, _, t)| OrderedFloat(*t))?;
		Some(RayHit {
			point: ray.at(t),
			entity: id,
			properties: entity.properties(),
		})
	}
}

impl TickSource for MemoryWorld {
	fn connect(&mut self) -> TickSubscription {
		self.next_subscription += 1;
		let subscription = TickSubscription(self.next_subscription);
		self.subscriptions.insert(subscription);
		subscription
	}

	fn disconnect(&mut self, subscription: TickSubscription) -> bool {
		self.subscriptions.remove(&subscription)
	}
}
