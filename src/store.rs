//! Project persistence.
//!
//! [`ProjectStore`] is the collaborator seam: browser `localStorage` in the
//! app, an in-memory map in tests or when storage is unavailable.
//! [`ProjectClient`] sits in front of any store and turns failures into log
//! lines plus an empty result, so UI code never handles a `StoreError`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use log::{error, info, warn};
use thiserror::Error;
use web_sys::Storage;

use crate::components::diagram_canvas::{ModelError, Project};

/// Key prefix for project records in `localStorage`.
pub const DEFAULT_KEY_PREFIX: &str = "service-canvas:project:";

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("storage unavailable: {0}")]
	Unavailable(String),

	#[error("storage operation failed: {0}")]
	Backend(String),

	#[error("project `{0}` not found")]
	NotFound(String),

	#[error(transparent)]
	Model(#[from] ModelError),
}

/// Durable home for projects. Every operation is async so a remote backend
/// fits behind the same seam.
#[allow(async_fn_in_trait)]
pub trait ProjectStore {
	/// Create and persist an empty project.
	async fn create_project(&self, name: &str) -> Result<Project, StoreError>;

	async fn load_projects(&self) -> Result<Vec<Project>, StoreError>;

	async fn delete_project(&self, id: &str) -> Result<(), StoreError>;

	/// Insert or overwrite the record with `project.id`.
	async fn save_project(&self, project: &Project) -> Result<(), StoreError>;
}

/// One JSON record per project under `{prefix}{id}`.
pub struct LocalStorageStore {
	storage: Storage,
	prefix: String,
}

impl LocalStorageStore {
	pub fn open(prefix: impl Into<String>) -> Result<Self, StoreError> {
		let window =
			web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".into()))?;
		let storage = window
			.local_storage()
			.map_err(|err| StoreError::Unavailable(format!("{err:?}")))?
			.ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))?;
		Ok(Self {
			storage,
			prefix: prefix.into(),
		})
	}

	fn key(&self, id: &str) -> String {
		format!("{}{}", self.prefix, id)
	}

	fn keys(&self) -> Result<Vec<String>, StoreError> {
		let len = self.storage.length().map_err(backend)?;
		let mut keys = Vec::new();
		for index in 0..len {
			if let Some(key) = self.storage.key(index).map_err(backend)?
				&& key.starts_with(&self.prefix)
			{
				keys.push(key);
			}
		}
		Ok(keys)
	}
}

fn backend(err: wasm_bindgen::JsValue) -> StoreError {
	StoreError::Backend(format!("{err:?}"))
}

impl ProjectStore for LocalStorageStore {
	async fn create_project(&self, name: &str) -> Result<Project, StoreError> {
		let project = Project::new(name);
		self.save_project(&project).await?;
		Ok(project)
	}

	async fn load_projects(&self) -> Result<Vec<Project>, StoreError> {
		let mut projects = Vec::new();
		for key in self.keys()? {
			let Some(json) = self.storage.get_item(&key).map_err(backend)? else {
				continue;
			};
			match Project::from_json(&json) {
				Ok(project) => projects.push(project),
				Err(err) => warn!("skipping unreadable record `{key}`: {err}"),
			}
		}
		projects.sort_by_key(|project| project.created_at);
		Ok(projects)
	}

	async fn delete_project(&self, id: &str) -> Result<(), StoreError> {
		let key = self.key(id);
		if self.storage.get_item(&key).map_err(backend)?.is_none() {
			return Err(StoreError::NotFound(id.to_owned()));
		}
		self.storage.remove_item(&key).map_err(backend)
	}

	async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
		let json = project.to_json()?;
		self.storage
			.set_item(&self.key(&project.id), &json)
			.map_err(backend)
	}
}

/// Projects kept in a map. `set_failing(true)` makes every call fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
	projects: RefCell<BTreeMap<String, Project>>,
	failing: Cell<bool>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_projects(projects: impl IntoIterator<Item = Project>) -> Self {
		let store = Self::default();
		store.projects.borrow_mut().extend(
			projects
				.into_iter()
				.map(|project| (project.id.clone(), project)),
		);
		store
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.set(failing);
	}

	pub fn get(&self, id: &str) -> Option<Project> {
		self.projects.borrow().get(id).cloned()
	}

	pub fn len(&self) -> usize {
		self.projects.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.projects.borrow().is_empty()
	}

	fn check(&self) -> Result<(), StoreError> {
		if self.failing.get() {
			return Err(StoreError::Backend("memory store set to fail".into()));
		}
		Ok(())
	}
}

impl ProjectStore for MemoryStore {
	async fn create_project(&self, name: &str) -> Result<Project, StoreError> {
		self.check()?;
		let project = Project::new(name);
		self.projects
			.borrow_mut()
			.insert(project.id.clone(), project.clone());
		Ok(project)
	}

	async fn load_projects(&self) -> Result<Vec<Project>, StoreError> {
		self.check()?;
		let mut projects: Vec<Project> = self.projects.borrow().values().cloned().collect();
		projects.sort_by_key(|project| project.created_at);
		Ok(projects)
	}

	async fn delete_project(&self, id: &str) -> Result<(), StoreError> {
		self.check()?;
		self.projects
			.borrow_mut()
			.remove(id)
			.map(|_| ())
			.ok_or_else(|| StoreError::NotFound(id.to_owned()))
	}

	async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
		self.check()?;
		self.projects
			.borrow_mut()
			.insert(project.id.clone(), project.clone());
		Ok(())
	}
}

/// The store the app runs on: `localStorage` when the browser allows it,
/// otherwise an in-memory map for the lifetime of the page.
pub enum BrowserStore {
	Local(LocalStorageStore),
	Memory(MemoryStore),
}

impl BrowserStore {
	pub fn open() -> Self {
		match LocalStorageStore::open(DEFAULT_KEY_PREFIX) {
			Ok(store) => Self::Local(store),
			Err(err) => {
				warn!("{err}; projects will not outlive this page");
				Self::Memory(MemoryStore::new())
			}
		}
	}
}

impl ProjectStore for BrowserStore {
	async fn create_project(&self, name: &str) -> Result<Project, StoreError> {
		match self {
			Self::Local(store) => store.create_project(name).await,
			Self::Memory(store) => store.create_project(name).await,
		}
	}

	async fn load_projects(&self) -> Result<Vec<Project>, StoreError> {
		match self {
			Self::Local(store) => store.load_projects().await,
			Self::Memory(store) => store.load_projects().await,
		}
	}

	async fn delete_project(&self, id: &str) -> Result<(), StoreError> {
		match self {
			Self::Local(store) => store.delete_project(id).await,
			Self::Memory(store) => store.delete_project(id).await,
		}
	}

	async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
		match self {
			Self::Local(store) => store.save_project(project).await,
			Self::Memory(store) => store.save_project(project).await,
		}
	}
}

/// Front for a [`ProjectStore`] that logs failures and returns an empty
/// result instead of an error.
pub struct ProjectClient<S> {
	store: S,
}

impl<S: ProjectStore> ProjectClient<S> {
	pub fn new(store: S) -> Self {
		Self { store }
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub async fn create_project(&self, name: &str) -> Option<Project> {
		match self.store.create_project(name).await {
			Ok(project) => {
				info!("created project `{}` ({})", project.name, project.id);
				Some(project)
			}
			Err(err) => {
				error!("failed to create project `{name}`: {err}");
				None
			}
		}
	}

	pub async fn load_projects(&self) -> Vec<Project> {
		self.store.load_projects().await.unwrap_or_else(|err| {
			error!("failed to load projects: {err}");
			Vec::new()
		})
	}

	pub async fn delete_project(&self, id: &str) -> bool {
		match self.store.delete_project(id).await {
			Ok(()) => true,
			Err(err) => {
				error!("failed to delete project `{id}`: {err}");
				false
			}
		}
	}

	pub async fn save_project(&self, project: &Project) -> bool {
		match self.store.save_project(project).await {
			Ok(()) => {
				info!("saved project `{}`", project.name);
				true
			}
			Err(err) => {
				error!("failed to save project `{}`: {err}", project.name);
				false
			}
		}
	}

	/// The most recently updated project, or a new "Untitled project" when
	/// the store is empty.
	pub async fn open_latest(&self) -> Option<Project> {
		let latest = self
			.load_projects()
			.await
			.into_iter()
			.max_by_key(|project| project.updated_at);
		match latest {
			Some(project) => Some(project),
			None => self.create_project("Untitled project").await,
		}
	}
}
