use crate::host::{EntityEdit, EntityId, ObjectStore};
use crate::shared::AnimationSettings;
use crate::util::ResultExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum Phase {
	#[default]
	Idle,
	Active,
}

/// Whether the current activation may still lay down paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintLatch {
	/// The next hit starts a new stroke.
	#[default]
	Ready,
	/// A stroke is open and takes further hits.
	Painting,
	/// The stroke filled up. Nothing more is painted until the can is activated again.
	Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	Started,
	Stopped,
}

/// Follows the shared grab state and switches the particle stream on and off to match.
#[derive(Debug, Clone)]
pub struct ActivationController {
	emitter: EntityId,
	phase: Phase,
	latch: PaintLatch,
}

impl ActivationController {
	pub fn new(emitter: EntityId) -> Self {
		Self {
			emitter,
			phase: Phase::Idle,
			latch: PaintLatch::Ready,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn is_active(&self) -> bool {
		self.phase == Phase::Active
	}

	pub fn latch(&self) -> PaintLatch {
		self.latch
	}

	pub fn is_painting(&self) -> bool {
		self.latch == PaintLatch::Painting
	}

	/// Moves to `Active` while `engaged` and to `Idle` otherwise. Only a change of phase touches
	/// the emitter.
	pub fn update(&mut self, store: &mut impl ObjectStore, engaged: bool) -> Option<Transition> {
		let transition = match (self.phase, engaged) {
			(Phase::Idle, true) => Transition::Started,
			(Phase::Active, false) => Transition::Stopped,
			_ => return None,
		};
		let running = transition == Transition::Started;
		self.phase = if running { Phase::Active } else { Phase::Idle };
		self.latch = PaintLatch::Ready;
		store
			.edit(
				self.emitter,
				EntityEdit {
					animation_settings: Some(AnimationSettings::running(running).to_json()),
					..Default::default()
				},
			)
			.ok_or_log();
		tracing::info!(emitter = %self.emitter, phase = %self.phase, "spray can {:?}", transition);
		Some(transition)
	}

	pub fn open_stroke(&mut self) {
		debug_assert!(self.is_active());
		self.latch = PaintLatch::Painting;
	}

	pub fn exhaust(&mut self) {
		self.latch = PaintLatch::Exhausted;
	}
}
