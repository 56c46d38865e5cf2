//! Serialized state shared with other participants through entity properties.
//!
//! Only this module touches JSON. Everything else works with the typed values.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifies a participant's session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl From<&str> for ParticipantId {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

/// Grab state written by whoever is holding the can.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrabKey {
	#[serde(default)]
	pub activated: bool,
	#[serde(default)]
	pub avatar_id: Option<ParticipantId>,
}

impl GrabKey {
	pub fn activated_by(participant: ParticipantId) -> Self {
		Self {
			activated: true,
			avatar_id: Some(participant),
		}
	}

	pub fn released_by(participant: ParticipantId) -> Self {
		Self {
			activated: false,
			avatar_id: Some(participant),
		}
	}

	/// Whether `participant` is the one currently spraying.
	pub fn engages(&self, participant: &ParticipantId) -> bool {
		self.activated && self.avatar_id.as_ref() == Some(participant)
	}
}

/// The parts of an entity's `userData` this crate understands. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub grab_key: Option<GrabKey>,
}

#[derive(Debug, thiserror::Error)]
pub enum SharedStateError {
	#[error("entity has no user data")]
	Missing,

	#[error("malformed user data: {0}")]
	Malformed(#[from] serde_json::Error),
}

static_assertions::assert_impl_all!(SharedStateError: std::error::Error, Send, Sync);

impl UserData {
	pub fn parse(user_data: Option<&str>) -> Result<Self, SharedStateError> {
		let user_data = user_data.ok_or(SharedStateError::Missing)?;
		Ok(serde_json::from_str(user_data)?)
	}

	/// Reads the grab state, treating anything unreadable as released.
	pub fn grab_key_or_released(user_data: Option<&str>) -> GrabKey {
		match Self::parse(user_data) {
			Ok(data) => data.grab_key.unwrap_or_default(),
			Err(SharedStateError::Missing) => GrabKey::default(),
			Err(error) => {
				tracing::warn!(%error, "ignoring shared state");
				GrabKey::default()
			}
		}
	}

	pub fn to_json(&self) -> String {
		// Serializing plain structs with string keys cannot fail.
		serde_json::to_string(self).unwrap_or_default()
	}
}

/// Playback settings of a particle effect. Absent fields are left unchanged by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSettings {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fps: Option<f32>,
	#[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
	pub looping: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_frame: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_frame: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub running: Option<bool>,
}

impl AnimationSettings {
	pub fn running(running: bool) -> Self {
		Self {
			running: Some(running),
			..Default::default()
		}
	}

	/// Overwrites every field that `patch` sets.
	pub fn merge(&mut self, patch: &AnimationSettings) {
		self.fps = patch.fps.or(self.fps);
		self.looping = patch.looping.or(self.looping);
		self.first_frame = patch.first_frame.or(self.first_frame);
		self.last_frame = patch.last_frame.or(self.last_frame);
		self.running = patch.running.or(self.running);
	}

	pub fn is_running(&self) -> bool {
		self.running.unwrap_or(false)
	}

	pub fn parse(json: &str) -> Result<Self, SharedStateError> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> String {
		serde_json::to_string(self).unwrap_or_default()
	}
}
