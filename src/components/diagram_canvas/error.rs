use thiserror::Error;

/// A persisted graph or element could not be turned into live canvas objects.
///
/// These are data-integrity failures: callers are expected to surface them,
/// not to recover by guessing.
#[derive(Debug, Error)]
pub enum ModelError {
	#[error("malformed JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("node `{id}` has non-finite geometry ({field} = {value})")]
	NonFiniteGeometry {
		id: String,
		field: &'static str,
		value: f64,
	},

	#[error("node id must not be empty")]
	EmptyNodeId,

	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),
}
