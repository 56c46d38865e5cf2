use crate::host::Rgb;
use glam::Vec3;
use serde::Deserialize;
use std::ops::Range;

/// Tuning for a spray can. Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, bon::Builder, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaintConfig {
	/// Distance of the nozzle in front of the can's origin.
	#[builder(default = 0.14)]
	pub tip_offset_z: f32,
	/// Distance of the nozzle above the can's origin.
	#[builder(default = 0.04)]
	pub tip_offset_y: f32,
	/// How far in front of the nozzle the pick ray starts, so it doesn't hit the can itself.
	#[builder(default = 1.0)]
	pub ray_push_out: f32,
	#[builder(default = 2.0)]
	pub ray_length: f32,

	#[builder(default = 40)]
	pub max_points_per_line: usize,
	/// Closer points would make zero-length segments whose binormals are NaN.
	#[builder(default = 0.01)]
	pub min_point_distance: f32,
	#[builder(default = 0.02)]
	pub stroke_width: f32,
	/// Lift off the painted surface to avoid z-fighting with it.
	#[builder(default = 0.1)]
	pub normal_offset: f32,

	#[builder(default = 160..250)]
	pub stroke_red: Range<u8>,
	#[builder(default = 10..20)]
	pub stroke_green: Range<u8>,
	#[builder(default = 190..250)]
	pub stroke_blue: Range<u8>,
	#[builder(default = Vec3::splat(5.0))]
	pub stroke_dimensions: Vec3,
	#[builder(default = 100.0)]
	pub stroke_lifetime: f32,

	#[builder(default)]
	pub emitter: EmitterConfig,
	/// Keep the particle emitter on the nozzle while spraying.
	#[builder(default = true)]
	pub track_emitter: bool,
}

impl Default for PaintConfig {
	fn default() -> Self {
		Self::builder().build()
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("malformed paint config")]
	Json(#[from] serde_json::Error),

	#[error("{channel} range {start}..{end} is empty")]
	EmptyColorRange {
		channel: &'static str,
		start: u8,
		end: u8,
	},
}

static_assertions::assert_impl_all!(ConfigError: std::error::Error, Send, Sync);

impl PaintConfig {
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks what deserialization alone cannot: every stroke color range must hold a value.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (channel, range) in [
			("red", &self.stroke_red),
			("green", &self.stroke_green),
			("blue", &self.stroke_blue),
		] {
			if range.is_empty() {
				return Err(ConfigError::EmptyColorRange {
					channel,
					start: range.start,
					end: range.end,
				});
			}
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterConfig {
	pub texture: String,
	pub emit_rate: f32,
	pub particle_radius: f32,
	pub color: Rgb,
	pub lifespan: f32,
	pub velocity_spread: Vec3,
	pub fps: f32,
	pub first_frame: f32,
	pub last_frame: f32,
}

impl Default for EmitterConfig {
	fn default() -> Self {
		Self {
			texture: "https://raw.githubusercontent.com/ericrius1/SantasLair/santa/assets/smokeparticle.png"
				.to_owned(),
			emit_rate: 100.0,
			particle_radius: 0.01,
			color: Rgb::new(170, 20, 150),
			lifespan: 5.0,
			velocity_spread: Vec3::splat(0.02),
			fps: 30.0,
			first_frame: 1.0,
			last_frame: 10000.0,
		}
	}
}
