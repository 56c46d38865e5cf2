use super::*;
use crate::config::PaintConfig;
use crate::geom::Pose;
use crate::host::*;
use crate::shared::{AnimationSettings, GrabKey, ParticipantId, UserData};
use crate::util::ResultExt;

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
	#[error("cannot read the spray can entity")]
	Entity(#[source] StoreError),

	#[error("cannot create the particle emitter")]
	Emitter(#[source] StoreError),
}

static_assertions::assert_impl_all!(AttachError: std::error::Error, Send, Sync);

/// What the paint side of a tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintOutcome {
	NoIntersection,
	Accepted(Accepted),
	Rejected(Rejected),
	/// The stroke filled up earlier in this activation.
	Exhausted,
	/// The store refused to create a stroke.
	StrokeFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
	pub transition: Option<Transition>,
	/// `None` unless the can is active.
	pub paint: Option<PaintOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetachReport {
	pub emitter_deleted: bool,
	pub strokes: DisposeReport,
}

/// One spray can entity, as seen by one participant.
///
/// Only the participant named in the can's grab state paints. Everyone else sees the strokes
/// and the particle stream through the shared entities.
#[derive(Debug)]
pub struct SprayCan {
	entity: EntityId,
	participant: ParticipantId,
	config: PaintConfig,
	sampler: GeometrySampler,
	buffer: StrokeBuffer,
	registry: StrokeRegistry,
	controller: ActivationController,
	emitter: EntityId,
	subscription: TickSubscription,
	pose: Pose,
	grab: GrabKey,
	last_nozzle: Option<Nozzle>,
	rng: fastrand::Rng,
}

impl SprayCan {
	pub fn attach(
		world: &mut impl World,
		entity: EntityId,
		participant: ParticipantId,
		config: PaintConfig,
	) -> Result<Self, AttachError> {
		Self::attach_with_rng(world, entity, participant, config, fastrand::Rng::new())
	}

	#[tracing::instrument(skip(world, config, rng), err)]
	pub fn attach_with_rng(
		world: &mut impl World,
		entity: EntityId,
		participant: ParticipantId,
		config: PaintConfig,
		rng: fastrand::Rng,
	) -> Result<Self, AttachError> {
		let properties = world.properties(entity).map_err(AttachError::Entity)?;
		let grab = UserData::grab_key_or_released(properties.user_data.as_deref());
		tracing::debug!(?grab, "read shared state");

		let emitter = world
			.create(EntityDescriptor::ParticleEffect(emitter_descriptor(
				&config,
				properties.pose,
			)))
			.map_err(AttachError::Emitter)?;
		let subscription = world.connect();

		let mut can = Self {
			entity,
			participant,
			sampler: GeometrySampler::new(&config),
			buffer: StrokeBuffer::new(&config),
			registry: StrokeRegistry::default(),
			controller: ActivationController::new(emitter),
			emitter,
			subscription,
			pose: properties.pose,
			grab,
			last_nozzle: None,
			rng,
			config,
		};

		// Picking up where a reload left off: the emitter was just created stopped, so start it.
		let engaged = can.grab.engages(&can.participant);
		can.controller.update(world, engaged);
		Ok(can)
	}

	/// Runs one frame: refreshes the can's pose and grab state, then paints if this participant is
	/// spraying.
	#[tracing::instrument(level = "trace", skip(self, world), fields(entity = %self.entity))]
	pub fn tick(
		&mut self,
		world: &mut (impl ObjectStore + IntersectionOracle),
		delta_time: f32,
	) -> TickReport {
		match world.properties(self.entity) {
			Ok(properties) => {
				self.pose = properties.pose;
				self.grab = UserData::grab_key_or_released(properties.user_data.as_deref());
			}
			Err(error) => {
				tracing::warn!(%error, "cannot read spray can, treating it as released");
				self.grab = GrabKey::default();
			}
		}

		let engaged = self.grab.engages(&self.participant);
		let transition = self.controller.update(world, engaged);
		match transition {
			Some(Transition::Started) => self.last_nozzle = None,
			Some(Transition::Stopped) => {
				if let Some(stroke) = self.buffer.close() {
					tracing::debug!(
						entity = %stroke.entity,
						points = stroke.len(),
						length = stroke.length(),
						"closed stroke"
					);
				}
			}
			None => {}
		}

		let paint = self.controller.is_active().then(|| self.spray(world));
		TickReport { transition, paint }
	}

	fn spray(&mut self, world: &mut (impl ObjectStore + IntersectionOracle)) -> PaintOutcome {
		if self.config.track_emitter {
			self.track_emitter(world);
		}

		let Some(sample) = self.sampler.sample(&*world, &self.pose) else {
			return PaintOutcome::NoIntersection;
		};

		match self.controller.latch() {
			PaintLatch::Exhausted => return PaintOutcome::Exhausted,
			PaintLatch::Painting => {}
			PaintLatch::Ready => {
				let began = self
					.buffer
					.begin_stroke(world, &mut self.registry, &mut self.rng, sample.point)
					.ok_or_log();
				if began.is_none() {
					return PaintOutcome::StrokeFailed;
				}
				self.controller.open_stroke();
			}
		}

		match self.buffer.try_append(world, sample.point, sample.normal) {
			Ok(accepted) => {
				if self.buffer.is_full() {
					tracing::debug!(points = accepted.index + 1, "stroke is full");
					self.controller.exhaust();
				}
				PaintOutcome::Accepted(accepted)
			}
			Err(rejected) => {
				if let Rejected::StrokeOverflow(points) = rejected {
					tracing::debug!(points, "stroke is full");
					self.controller.exhaust();
				} else {
					tracing::trace!(%rejected, "sample rejected");
				}
				PaintOutcome::Rejected(rejected)
			}
		}
	}

	/// Keeps the particle stream coming out of the nozzle.
	fn track_emitter(&mut self, store: &mut impl ObjectStore) {
		let nozzle = self.sampler.nozzle(&self.pose);
		if self.last_nozzle == Some(nozzle) {
			return;
		}
		self.last_nozzle = Some(nozzle);
		store
			.edit(
				self.emitter,
				EntityEdit {
					position: Some(nozzle.position),
					emit_velocity: Some(nozzle.forward),
					..Default::default()
				},
			)
			.ok_or_warn("cannot move particle emitter");
	}

	/// Stops ticking and deletes every entity this can created. Works in any state.
	#[tracing::instrument(skip(self, world), fields(entity = %self.entity))]
	pub fn detach(mut self, world: &mut impl World) -> DetachReport {
		if !world.disconnect(self.subscription) {
			tracing::warn!(subscription = %self.subscription, "tick subscription was already gone");
		}
		let emitter_deleted = world
			.delete(self.emitter)
			.ok_or_warn("cannot delete particle emitter")
			.is_some();
		self.buffer.close();
		let strokes = self.registry.dispose_all(world);
		tracing::info!(emitter_deleted, ?strokes, "detached spray can");
		DetachReport {
			emitter_deleted,
			strokes,
		}
	}

	pub fn entity(&self) -> EntityId {
		self.entity
	}

	pub fn participant(&self) -> &ParticipantId {
		&self.participant
	}

	pub fn config(&self) -> &PaintConfig {
		&self.config
	}

	pub fn emitter(&self) -> EntityId {
		self.emitter
	}

	pub fn subscription(&self) -> TickSubscription {
		self.subscription
	}

	pub fn phase(&self) -> Phase {
		self.controller.phase()
	}

	pub fn latch(&self) -> PaintLatch {
		self.controller.latch()
	}

	pub fn is_painting(&self) -> bool {
		self.controller.is_painting()
	}

	pub fn pose(&self) -> &Pose {
		&self.pose
	}

	pub fn current_stroke(&self) -> Option<&Stroke> {
		self.buffer.current()
	}

	pub fn strokes(&self) -> &StrokeRegistry {
		&self.registry
	}
}

fn emitter_descriptor(config: &PaintConfig, pose: Pose) -> ParticleEffectDescriptor {
	let emitter = &config.emitter;
	let animation_settings = AnimationSettings {
		fps: Some(emitter.fps),
		looping: Some(true),
		first_frame: Some(emitter.first_frame),
		last_frame: Some(emitter.last_frame),
		running: Some(false),
	};
	ParticleEffectDescriptor {
		position: pose.position,
		animation_settings: animation_settings.to_json(),
		texture: emitter.texture.clone(),
		emit_velocity: glam::Vec3::ZERO,
		emit_acceleration: glam::Vec3::ZERO,
		velocity_spread: emitter.velocity_spread,
		emit_rate: emitter.emit_rate,
		particle_radius: emitter.particle_radius,
		color: emitter.color,
		lifespan: emitter.lifespan,
	}
}
