use glam::{Quat, Vec3};
use spraypaint::engine::{PaintOutcome, Transition};
use spraypaint::geom::Pose;
use spraypaint::host::EntityKind;
use spraypaint::*;

#[derive(thiserror::Error, Debug)]
#[error("no global tracing subscriber set")]
struct NoTracingSubscriber;

fn configure_tracing() -> anyhow::Result<()> {
	let result: Result<(), NoTracingSubscriber> = Err(NoTracingSubscriber);

	let result = result.or_else(|_| {
		let max_level = if cfg!(debug_assertions) {
			tracing::Level::TRACE
		} else {
			tracing::Level::INFO
		};
		tracing::subscriber::set_global_default(
			tracing_subscriber::FmtSubscriber::builder()
				.with_max_level(max_level)
				.finish(),
		)
	});

	Ok(result?)
}

fn configure_logging() -> anyhow::Result<()> {
	configure_tracing()?;

	// Redirect `log` to `tracing`. Because we enable the "log" feature on the `tracing` crate, the
	// reverse happens if we fail to set `tracing`s global default subscriber above.
	#[cfg(feature = "log")]
	tracing_log::LogTracer::init()?;
	Ok(())
}

fn load_config() -> anyhow::Result<PaintConfig> {
	match std::env::args().nth(1) {
		Some(path) => Ok(PaintConfig::from_json(&std::fs::read_to_string(path)?)?),
		None => Ok(PaintConfig::default()),
	}
}

const FRAME: f32 = 1.0 / 60.0;

/// Sprays a wall in a few passes, the way a participant holding the can would.
fn run(config: PaintConfig) -> anyhow::Result<()> {
	let mut world = MemoryWorld::new();
	let me = ParticipantId::from("local-session");

	world.spawn_solid(
		Pose::new(Vec3::new(0.0, 1.0, -1.5), Quat::IDENTITY),
		Vec3::new(10.0, 10.0, 0.1),
	);
	let can_entity = world.spawn_solid(
		Pose::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
		Vec3::splat(0.1),
	);

	let mut can = SprayCan::attach(&mut world, can_entity, me.clone(), config)?;

	let mut accepted = 0;
	for pass in 0..3 {
		world.set_grab(can_entity, GrabKey::activated_by(me.clone()))?;
		for frame in 0..90 {
			// Sweep left to right, a little lower on every pass.
			let yaw = 0.6 - 1.2 * frame as f32 / 90.0;
			let pitch = -0.1 * pass as f32;
			let rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch);
			world.set_pose(can_entity, Pose::new(Vec3::new(0.0, 1.0, 0.0), rotation))?;

			let report = can.tick(&mut world, FRAME);
			if let Some(PaintOutcome::Accepted(_)) = report.paint {
				accepted += 1;
			}
			if report.transition == Some(Transition::Started) {
				tracing::info!(pass, "trigger pressed");
			}
			world.advance(FRAME);
		}
		world.set_grab(can_entity, GrabKey::released_by(me.clone()))?;
		can.tick(&mut world, FRAME);
	}

	let lines: Vec<_> = world.entities_of_kind(EntityKind::PolyLine).collect();
	for &line in &lines {
		if let Some(geometry) = world.geometry(line) {
			println!("{line}: {} points", geometry.line_points.len());
		}
	}
	println!(
		"{} strokes, {accepted} points accepted",
		can.strokes().len()
	);

	let report = can.detach(&mut world);
	println!(
		"detached: emitter deleted = {}, strokes deleted = {}, failed = {}",
		report.emitter_deleted, report.strokes.deleted, report.strokes.failed
	);
	Ok(())
}

fn main() -> anyhow::Result<()> {
	if let Err(error) = configure_logging() {
		// We can technically continue without logging.
		tracing::error!(error = error.to_string());
	}

	run(load_config()?)
}
