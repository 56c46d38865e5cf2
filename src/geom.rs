use glam::{Quat, Vec3};

/// Direction an unrotated entity faces.
pub const FRONT: Vec3 = Vec3::NEG_Z;
pub const UP: Vec3 = Vec3::Y;

pub fn front(rotation: Quat) -> Vec3 {
	rotation * FRONT
}

pub fn up(rotation: Quat) -> Vec3 {
	rotation * UP
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
	pub position: Vec3,
	pub rotation: Quat,
}

impl Default for Pose {
	fn default() -> Self {
		Self {
			position: Vec3::ZERO,
			rotation: Quat::IDENTITY,
		}
	}
}

impl Pose {
	pub fn new(position: Vec3, rotation: Quat) -> Self {
		Self { position, rotation }
	}

	pub fn front(&self) -> Vec3 {
		front(self.rotation)
	}

	pub fn up(&self) -> Vec3 {
		up(self.rotation)
	}
}

/// A finite ray. The length of `direction` is the reach of the ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
	pub origin: Vec3,
	pub direction: Vec3,
}

impl Ray {
	pub fn at(&self, t: f32) -> Vec3 {
		self.origin + self.direction * t
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABox {
	min: Vec3,
	max: Vec3,
}

impl AABox {
	pub fn new(min: Vec3, max: Vec3) -> Self {
		Self { min, max }
	}

	pub fn centered(dimensions: Vec3) -> Self {
		let half = dimensions * 0.5;
		Self::new(-half, half)
	}

	/// Slab test. Returns the smallest `t` in `[0, 1]` at which `ray` enters the box, or
	/// `0` when the ray starts inside.
	pub fn ray_hit(&self, ray: &Ray) -> Option<f32> {
		let mut t_min = f32::NEG_INFINITY;
		let mut t_max = f32::INFINITY;
		for axis in 0..3 {
			let origin = ray.origin[axis];
			let direction = ray.direction[axis];
			if direction == 0.0 {
				if origin < self.min[axis] || origin > self.max[axis] {
					return None;
				}
				continue;
			}
			let inv = direction.recip();
			let mut t0 = (self.min[axis] - origin) * inv;
			let mut t1 = (self.max[axis] - origin) * inv;
			if t0 > t1 {
				std::mem::swap(&mut t0, &mut t1);
			}
			t_min = t_min.max(t0);
			t_max = t_max.min(t1);
			if t_min > t_max {
				return None;
			}
		}
		if t_max < 0.0 || t_min > 1.0 {
			return None;
		}
		Some(t_min.max(0.0))
	}
}

/// Intersects `ray` with a box of `dimensions` centered on `pose`.
pub fn ray_hits_oriented_box(ray: &Ray, pose: &Pose, dimensions: Vec3) -> Option<f32> {
	let inverse = pose.rotation.inverse();
	let local = Ray {
		origin: inverse * (ray.origin - pose.position),
		direction: inverse * ray.direction,
	};
	AABox::centered(dimensions).ray_hit(&local)
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	#[test]
	fn identity_faces_negative_z() {
		let pose = Pose::default();
		assert_eq!(pose.front(), Vec3::NEG_Z);
		assert_eq!(pose.up(), Vec3::Y);
	}

	#[test]
	fn rotated_front() {
		let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
		assert_relative_eq!(pose.front().x, -1.0, epsilon = 1e-6);
		assert_relative_eq!(pose.front().z, 0.0, epsilon = 1e-6);
	}

	#[test]
	fn ray_hit_front_face() {
		let b = AABox::centered(Vec3::splat(2.0));
		let ray = Ray {
			origin: Vec3::new(0.0, 0.0, 3.0),
			direction: Vec3::new(0.0, 0.0, -4.0),
		};
		let t = b.ray_hit(&ray).unwrap();
		assert_relative_eq!(t, 0.5);
		assert_relative_eq!(ray.at(t).z, 1.0);
	}

	#[test]
	fn ray_too_short() {
		let b = AABox::centered(Vec3::splat(2.0));
		let ray = Ray {
			origin: Vec3::new(0.0, 0.0, 3.0),
			direction: Vec3::new(0.0, 0.0, -1.0),
		};
		assert_eq!(b.ray_hit(&ray), None);
	}

	#[test]
	fn ray_misses_to_the_side() {
		let b = AABox::centered(Vec3::splat(2.0));
		let ray = Ray {
			origin: Vec3::new(5.0, 0.0, 3.0),
			direction: Vec3::new(0.0, 0.0, -10.0),
		};
		assert_eq!(b.ray_hit(&ray), None);
	}

	#[test]
	fn oriented_box() {
		let pose = Pose::new(
			Vec3::new(0.0, 0.0, -2.0),
			Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
		);
		// Thin along local x, which is world z after rotation.
		let dimensions = Vec3::new(0.1, 4.0, 4.0);
		let ray = Ray {
			origin: Vec3::new(0.0, 0.0, 0.0),
			direction: Vec3::new(0.0, 0.0, -4.0),
		};
		let t = ray_hits_oriented_box(&ray, &pose, dimensions).unwrap();
		assert_relative_eq!(ray.at(t).z, -1.95, epsilon = 1e-5);
	}
}
