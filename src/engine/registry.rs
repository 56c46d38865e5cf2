use crate::host::{EntityId, ObjectStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
	pub deleted: usize,
	pub failed: usize,
}

/// Every stroke entity a spray can has created, so they can be removed with it.
#[derive(Debug, Clone, Default)]
pub struct StrokeRegistry {
	strokes: Vec<EntityId>,
}

impl StrokeRegistry {
	pub fn register(&mut self, entity: EntityId) {
		self.strokes.push(entity);
	}

	pub fn len(&self) -> usize {
		self.strokes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strokes.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
		self.strokes.iter().copied()
	}

	/// Deletes every registered stroke. Failures are logged and do not stop the others; the host
	/// may already have expired some of them.
	pub fn dispose_all(&mut self, store: &mut impl ObjectStore) -> DisposeReport {
		let mut report = DisposeReport::default();
		for entity in std::mem::take(&mut self.strokes) {
			match store.delete(entity) {
				Ok(()) => report.deleted += 1,
				Err(error) => {
					tracing::warn!(%entity, %error, "failed to delete stroke");
					report.failed += 1;
				}
			}
		}
		report
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::*;
	use crate::world::MemoryWorld;
	use glam::Vec3;

	fn poly_line(world: &mut MemoryWorld) -> EntityId {
		world
			.create(EntityDescriptor::PolyLine(PolyLineDescriptor {
				position: Vec3::ZERO,
				color: Rgb::default(),
				dimensions: Vec3::ONE,
				lifetime: None,
			}))
			.unwrap()
	}

	#[test]
	fn disposes_everything_once() {
		let mut world = MemoryWorld::default();
		let mut registry = StrokeRegistry::default();
		let strokes: Vec<_> = (0..3).map(|_| poly_line(&mut world)).collect();
		strokes.iter().for_each(|&s| registry.register(s));

		let report = registry.dispose_all(&mut world);
		assert_eq!(report, DisposeReport { deleted: 3, failed: 0 });
		assert!(registry.is_empty());
		for stroke in strokes {
			assert_eq!(world.delete_count(stroke), 1);
			assert!(world.entity(stroke).is_none());
		}

		// Nothing left to delete.
		assert_eq!(registry.dispose_all(&mut world), DisposeReport::default());
	}

	#[test]
	fn keeps_going_after_a_failure() {
		let mut world = MemoryWorld::default();
		let mut registry = StrokeRegistry::default();
		let a = poly_line(&mut world);
		let b = poly_line(&mut world);
		let c = poly_line(&mut world);
		for s in [a, b, c] {
			registry.register(s);
		}
		world.delete(b).unwrap();

		let report = registry.dispose_all(&mut world);
		assert_eq!(report, DisposeReport { deleted: 2, failed: 1 });
		assert!(world.entity(a).is_none());
		assert!(world.entity(c).is_none());
	}
}
