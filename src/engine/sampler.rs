use crate::config::PaintConfig;
use crate::geom::{self, Pose, Ray};
use crate::host::IntersectionOracle;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
	pub point: Vec3,
	pub normal: Vec3,
}

/// Where paint leaves the can.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nozzle {
	pub position: Vec3,
	pub forward: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySampler {
	tip_offset_z: f32,
	tip_offset_y: f32,
	ray_push_out: f32,
	ray_length: f32,
}

impl GeometrySampler {
	pub fn new(config: &PaintConfig) -> Self {
		Self {
			tip_offset_z: config.tip_offset_z,
			tip_offset_y: config.tip_offset_y,
			ray_push_out: config.ray_push_out,
			ray_length: config.ray_length,
		}
	}

	pub fn nozzle(&self, pose: &Pose) -> Nozzle {
		let forward = pose.front();
		let position = pose.position + forward * self.tip_offset_z + pose.up() * self.tip_offset_y;
		Nozzle { position, forward }
	}

	pub fn ray(&self, pose: &Pose) -> Ray {
		let nozzle = self.nozzle(pose);
		Ray {
			origin: nozzle.position + nozzle.forward * self.ray_push_out,
			direction: nozzle.forward * self.ray_length,
		}
	}

	/// Casts from the nozzle and reports where paint would land.
	///
	/// The normal is the reverse of the struck entity's front, not the true surface normal. That
	/// is only right for flat targets facing the can.
	pub fn sample(&self, oracle: &impl IntersectionOracle, pose: &Pose) -> Option<Sample> {
		let hit = oracle.cast(&self.ray(pose))?;
		Some(Sample {
			point: hit.point,
			normal: -geom::front(hit.properties.pose.rotation),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::{EntityId, EntityKind, EntityProperties, RayHit};
	use approx::assert_relative_eq;
	use glam::Quat;
	use std::cell::RefCell;

	struct RecordingOracle {
		rays: RefCell<Vec<Ray>>,
		hit: Option<RayHit>,
	}

	impl IntersectionOracle for RecordingOracle {
		fn cast(&self, ray: &Ray) -> Option<RayHit> {
			self.rays.borrow_mut().push(*ray);
			self.hit.clone()
		}
	}

	fn wall_hit(rotation: Quat) -> RayHit {
		RayHit {
			point: Vec3::new(0.0, 0.0, -1.5),
			entity: EntityId(7),
			properties: EntityProperties {
				kind: EntityKind::Solid,
				pose: Pose::new(Vec3::new(0.0, 0.0, -1.5), rotation),
				dimensions: Vec3::new(10.0, 10.0, 0.1),
				user_data: None,
			},
		}
	}

	#[test]
	fn ray_starts_past_the_nozzle() {
		let sampler = GeometrySampler::new(&PaintConfig::default());
		let ray = sampler.ray(&Pose::default());
		assert_relative_eq!(ray.origin.x, 0.0);
		assert_relative_eq!(ray.origin.y, 0.04, epsilon = 1e-6);
		assert_relative_eq!(ray.origin.z, -1.14, epsilon = 1e-6);
		assert_eq!(ray.direction, Vec3::new(0.0, 0.0, -2.0));
	}

	#[test]
	fn nozzle_follows_rotation() {
		let sampler = GeometrySampler::new(&PaintConfig::default());
		let pose = Pose::new(
			Vec3::new(1.0, 0.0, 0.0),
			Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
		);
		// Pitched up: front is +y, up is +z.
		let nozzle = sampler.nozzle(&pose);
		assert_relative_eq!(nozzle.forward.y, 1.0, epsilon = 1e-6);
		assert_relative_eq!(nozzle.position.x, 1.0, epsilon = 1e-6);
		assert_relative_eq!(nozzle.position.y, 0.14, epsilon = 1e-6);
		assert_relative_eq!(nozzle.position.z, 0.04, epsilon = 1e-6);
	}

	#[test]
	fn normal_faces_back_out_of_struck_entity() {
		let sampler = GeometrySampler::new(&PaintConfig::default());
		let oracle = RecordingOracle {
			rays: Default::default(),
			hit: Some(wall_hit(Quat::IDENTITY)),
		};
		let sample = sampler.sample(&oracle, &Pose::default()).unwrap();
		assert_eq!(sample.point, Vec3::new(0.0, 0.0, -1.5));
		assert_relative_eq!(sample.normal.z, 1.0, epsilon = 1e-6);
		assert_eq!(oracle.rays.borrow().len(), 1);
	}

	#[test]
	fn miss() {
		let sampler = GeometrySampler::new(&PaintConfig::default());
		let oracle = RecordingOracle {
			rays: Default::default(),
			hit: None,
		};
		assert_eq!(sampler.sample(&oracle, &Pose::default()), None);
	}
}
