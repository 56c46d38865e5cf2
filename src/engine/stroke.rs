use super::StrokeRegistry;
use crate::config::PaintConfig;
use crate::host::*;
use crate::util::ResultExt;
use glam::Vec3;
use itertools::Itertools;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Rejected {
	#[error("no stroke is open")]
	NoStroke,

	#[error("point is only {distance} from the previous one")]
	TooClose { distance: f32 },

	#[error("stroke already holds {0} points")]
	StrokeOverflow(usize),

	#[error("store refused the stroke geometry")]
	StoreFailed,
}

static_assertions::assert_impl_all!(Rejected: std::error::Error, Send, Sync);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
	pub index: usize,
}

/// A poly-line being painted. Points are relative to `base_position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
	pub entity: EntityId,
	pub base_position: Vec3,
	geometry: PolyLineGeometry,
}

impl Stroke {
	pub fn geometry(&self) -> &PolyLineGeometry {
		&self.geometry
	}

	pub fn len(&self) -> usize {
		self.geometry.line_points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.geometry.line_points.is_empty()
	}

	pub fn last_point(&self) -> Option<Vec3> {
		self.geometry.line_points.last().copied()
	}

	/// Total length of the poly-line.
	pub fn length(&self) -> f32 {
		self
			.geometry
			.line_points
			.iter()
			.tuple_windows()
			.map(|(a, b)| a.distance(*b))
			.sum()
	}
}

#[derive(Debug, Clone)]
pub struct StrokeStyle {
	pub red: Range<u8>,
	pub green: Range<u8>,
	pub blue: Range<u8>,
	pub dimensions: Vec3,
	pub lifetime: f32,
}

impl StrokeStyle {
	/// An empty channel range yields its start rather than panicking.
	fn random_color(&self, rng: &mut fastrand::Rng) -> Rgb {
		let mut channel = |range: &Range<u8>| {
			if range.is_empty() {
				range.start
			} else {
				rng.u8(range.clone())
			}
		};
		Rgb::new(channel(&self.red), channel(&self.green), channel(&self.blue))
	}
}

#[derive(Debug, Clone)]
pub struct StrokeBuffer {
	max_points: usize,
	min_point_distance: f32,
	stroke_width: f32,
	normal_offset: f32,
	style: StrokeStyle,
	current: Option<Stroke>,
}

impl StrokeBuffer {
	pub fn new(config: &PaintConfig) -> Self {
		Self {
			max_points: config.max_points_per_line,
			min_point_distance: config.min_point_distance,
			stroke_width: config.stroke_width,
			normal_offset: config.normal_offset,
			style: StrokeStyle {
				red: config.stroke_red.clone(),
				green: config.stroke_green.clone(),
				blue: config.stroke_blue.clone(),
				dimensions: config.stroke_dimensions,
				lifetime: config.stroke_lifetime,
			},
			current: None,
		}
	}

	pub fn current(&self) -> Option<&Stroke> {
		self.current.as_ref()
	}

	/// Starts a new stroke anchored at `point`. The previous stroke, if any, stays in the store
	/// untouched.
	#[tracing::instrument(skip(self, store, registry, rng))]
	pub fn begin_stroke(
		&mut self,
		store: &mut impl ObjectStore,
		registry: &mut StrokeRegistry,
		rng: &mut fastrand::Rng,
		point: Vec3,
	) -> Result<EntityId, StoreError> {
		self.current = None;
		let color = self.style.random_color(rng);
		let entity = store.create(EntityDescriptor::PolyLine(PolyLineDescriptor {
			position: point,
			color,
			dimensions: self.style.dimensions,
			lifetime: Some(self.style.lifetime),
		}))?;
		registry.register(entity);
		tracing::debug!(%entity, ?color, "began stroke");
		self.current = Some(Stroke {
			entity,
			base_position: point,
			geometry: PolyLineGeometry::default(),
		});
		Ok(entity)
	}

	pub fn is_full(&self) -> bool {
		self
			.current
			.as_ref()
			.is_some_and(|stroke| stroke.len() >= self.max_points)
	}

	/// Converts a world-space point on a surface into the current stroke's frame.
	pub fn to_local(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
		let stroke = self.current.as_ref()?;
		Some(point - stroke.base_position + normal * self.normal_offset)
	}

	/// Adds a point to the current stroke and pushes the whole poly-line to the store.
	///
	/// If the store refuses the edit the point is taken back out, so the buffer never holds
	/// anything the store has not seen.
	pub fn try_append(
		&mut self,
		store: &mut impl ObjectStore,
		point: Vec3,
		normal: Vec3,
	) -> Result<Accepted, Rejected> {
		let local = self.to_local(point, normal).ok_or(Rejected::NoStroke)?;
		if self.is_full() {
			return Err(Rejected::StrokeOverflow(self.max_points));
		}
		let stroke = self.current.as_mut().ok_or(Rejected::NoStroke)?;
		if let Some(last) = stroke.last_point() {
			let distance = local.distance(last);
			if distance < self.min_point_distance {
				return Err(Rejected::TooClose { distance });
			}
		}

		let geometry = &mut stroke.geometry;
		geometry.line_points.push(local);
		geometry.normals.push(normal);
		geometry.stroke_widths.push(self.stroke_width);
		let index = geometry.line_points.len() - 1;

		let sent = store
			.edit(
				stroke.entity,
				EntityEdit {
					geometry: Some(geometry.clone()),
					..Default::default()
				},
			)
			.ok_or_log();
		if sent.is_none() {
			geometry.line_points.pop();
			geometry.normals.pop();
			geometry.stroke_widths.pop();
			return Err(Rejected::StoreFailed);
		}
		tracing::trace!(entity = %stroke.entity, index, "appended point");
		Ok(Accepted { index })
	}

	/// The geometry of the current stroke as it was last sent to the store.
	pub fn representation(&self) -> Option<&PolyLineGeometry> {
		self.current.as_ref().map(Stroke::geometry)
	}

	/// Forgets the current stroke. Its entity stays registered.
	pub fn close(&mut self) -> Option<Stroke> {
		self.current.take()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::world::MemoryWorld;
	use approx::assert_relative_eq;

	fn buffer(config: PaintConfig) -> (StrokeBuffer, MemoryWorld, StrokeRegistry, fastrand::Rng) {
		(
			StrokeBuffer::new(&config),
			MemoryWorld::default(),
			StrokeRegistry::default(),
			fastrand::Rng::with_seed(0x13371337),
		)
	}

	#[test]
	fn first_point_is_offset_along_normal() {
		let (mut buffer, mut store, mut registry, mut rng) = buffer(PaintConfig::default());
		let point = Vec3::new(1.0, 0.0, 0.0);
		buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, point)
			.unwrap();
		let accepted = buffer.try_append(&mut store, point, Vec3::Y).unwrap();
		assert_eq!(accepted.index, 0);

		let geometry = buffer.representation().unwrap();
		assert_eq!(geometry.line_points.len(), 1);
		assert_relative_eq!(geometry.line_points[0].y, 0.1);
		assert_eq!(geometry.normals, vec![Vec3::Y]);
		assert_eq!(geometry.stroke_widths, vec![0.02]);
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn begin_creates_a_poly_line_in_range() {
		let (mut buffer, mut store, mut registry, mut rng) = buffer(PaintConfig::default());
		let entity = buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, Vec3::ONE)
			.unwrap();
		let EntityDescriptor::PolyLine(descriptor) = &store.entity(entity).unwrap().descriptor else {
			panic!("expected a poly-line");
		};
		assert_eq!(descriptor.position, Vec3::ONE);
		assert!((160..250).contains(&descriptor.color.red));
		assert!((10..20).contains(&descriptor.color.green));
		assert!((190..250).contains(&descriptor.color.blue));
		assert_eq!(descriptor.dimensions, Vec3::splat(5.0));
		assert_eq!(descriptor.lifetime, Some(100.0));
	}

	#[test]
	fn rejects_close_points() {
		let (mut buffer, mut store, mut registry, mut rng) = buffer(PaintConfig::default());
		let point = Vec3::new(1.0, 0.0, 0.0);
		buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, point)
			.unwrap();
		buffer.try_append(&mut store, point, Vec3::Y).unwrap();
		let edits = store.edit_count();

		let result = buffer.try_append(&mut store, Vec3::new(1.0, 0.0, 0.001), Vec3::Y);
		assert!(matches!(result, Err(Rejected::TooClose { .. })));
		assert_eq!(buffer.current().unwrap().len(), 1);
		assert_eq!(store.edit_count(), edits);
	}

	#[test]
	fn needs_an_open_stroke() {
		let (mut buffer, mut store, _, _) = buffer(PaintConfig::default());
		assert_eq!(
			buffer.try_append(&mut store, Vec3::ZERO, Vec3::Y),
			Err(Rejected::NoStroke)
		);
		assert!(!buffer.is_full());
	}

	#[test]
	fn caps_at_max_points() {
		let config = PaintConfig::builder().max_points_per_line(3).build();
		let (mut buffer, mut store, mut registry, mut rng) = buffer(config);
		buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, Vec3::ZERO)
			.unwrap();
		for i in 0..3 {
			let point = Vec3::new(i as f32 * 0.1, 0.0, 0.0);
			buffer.try_append(&mut store, point, Vec3::Z).unwrap();
		}
		assert!(buffer.is_full());
		assert_eq!(
			buffer.try_append(&mut store, Vec3::new(1.0, 0.0, 0.0), Vec3::Z),
			Err(Rejected::StrokeOverflow(3))
		);
		assert_eq!(buffer.current().unwrap().len(), 3);
	}

	#[test]
	fn sequences_stay_aligned_and_spaced() {
		let (mut buffer, mut store, mut registry, mut rng) = buffer(PaintConfig::default());
		buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, Vec3::ZERO)
			.unwrap();
		let mut sampler = fastrand::Rng::with_seed(7);
		for _ in 0..200 {
			let point = Vec3::new(sampler.f32(), sampler.f32(), 0.0) * 0.05;
			let _ = buffer.try_append(&mut store, point, Vec3::Z);
			let geometry = buffer.representation().unwrap();
			assert_eq!(geometry.line_points.len(), geometry.normals.len());
			assert_eq!(geometry.line_points.len(), geometry.stroke_widths.len());
		}
		let points = &buffer.representation().unwrap().line_points;
		assert!(points.len() <= 40);
		for (a, b) in points.iter().tuple_windows() {
			assert!(a.distance(*b) >= 0.01);
		}
	}

	#[test]
	fn store_sees_every_accepted_point() {
		let (mut buffer, mut store, mut registry, mut rng) = buffer(PaintConfig::default());
		let entity = buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, Vec3::ZERO)
			.unwrap();
		buffer.try_append(&mut store, Vec3::ZERO, Vec3::Z).unwrap();
		buffer.try_append(&mut store, Vec3::X, Vec3::Z).unwrap();
		assert_eq!(
			store.geometry(entity).map(|g| g.line_points.len()),
			Some(2)
		);
		assert_relative_eq!(buffer.current().unwrap().length(), 1.0);
	}

	#[test]
	fn refused_edit_takes_the_point_back() {
		let (mut buffer, mut store, mut registry, mut rng) = buffer(PaintConfig::default());
		let entity = buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, Vec3::ZERO)
			.unwrap();
		buffer.try_append(&mut store, Vec3::ZERO, Vec3::Z).unwrap();
		store.delete(entity).unwrap();

		assert_eq!(
			buffer.try_append(&mut store, Vec3::X, Vec3::Z),
			Err(Rejected::StoreFailed)
		);
		let geometry = buffer.representation().unwrap();
		assert_eq!(geometry.line_points.len(), 1);
		assert_eq!(geometry.normals.len(), 1);
		assert_eq!(geometry.stroke_widths.len(), 1);
	}

	#[test]
	fn empty_color_range_uses_its_start() {
		let config = PaintConfig::builder().stroke_green(15..15).build();
		let (mut buffer, mut store, mut registry, mut rng) = buffer(config);
		let entity = buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, Vec3::ZERO)
			.unwrap();
		let EntityDescriptor::PolyLine(descriptor) = &store.entity(entity).unwrap().descriptor else {
			panic!("expected a poly-line");
		};
		assert_eq!(descriptor.color.green, 15);
		assert!((160..250).contains(&descriptor.color.red));
	}

	#[test]
	fn close_keeps_registration() {
		let (mut buffer, mut store, mut registry, mut rng) = buffer(PaintConfig::default());
		let entity = buffer
			.begin_stroke(&mut store, &mut registry, &mut rng, Vec3::ZERO)
			.unwrap();
		assert_eq!(buffer.close().map(|s| s.entity), Some(entity));
		assert!(buffer.current().is_none());
		assert_eq!(registry.len(), 1);
	}
}
