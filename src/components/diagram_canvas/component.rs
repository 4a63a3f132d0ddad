use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::autosave::{AutosaveConfig, BrowserClock, SaveEvent, SaveScheduler};
use super::config::CanvasConfig;
use super::context_menu::{CanvasCommand, ContextMenu};
use super::geometry::Point;
use super::render::render;
use super::state::{Button, CanvasState, Effect as CanvasEffect};
use super::types::{Project, ServiceDefinition};
use crate::store::{ProjectClient, ProjectStore};

/// Reactive bits of the overlay UI.
#[derive(Clone, Copy)]
struct CanvasView {
	cursor: RwSignal<&'static str>,
	menu: RwSignal<ContextMenu>,
	saving: RwSignal<bool>,
	error: RwSignal<Option<String>>,
}

struct Engine {
	state: CanvasState,
	ctx: CanvasRenderingContext2d,
}

/// Owns the engine once the canvas is mounted, plus the autosave timer.
struct CanvasHost<S> {
	engine: RefCell<Option<Engine>>,
	project: RefCell<Project>,
	config: CanvasConfig,
	saves: RefCell<SaveScheduler<BrowserClock>>,
	timer: Cell<Option<TimeoutHandle>>,
	/// Window resize listener, kept so it can be detached on unmount.
	resize: RefCell<Option<Closure<dyn FnMut()>>>,
	client: Rc<ProjectClient<S>>,
	view: CanvasView,
}

impl<S: ProjectStore + 'static> CanvasHost<S> {
	fn mount(&self, ctx: CanvasRenderingContext2d, width: f64, height: f64) {
		let project = self.project.borrow();
		match CanvasState::from_project(&project, self.config.clone(), width, height) {
			Ok(mut state) => {
				let mut ctx = ctx;
				render(&mut state, &mut ctx);
				*self.engine.borrow_mut() = Some(Engine { state, ctx });
			}
			Err(err) => {
				error!("cannot open project `{}`: {err}", project.name);
				self.view.error.set(Some(err.to_string()));
			}
		}
	}

	/// Run one engine call, redraw, then act on what it asked for.
	fn dispatch(
		self: &Rc<Self>,
		f: impl FnOnce(&mut CanvasState, &mut CanvasRenderingContext2d) -> Vec<CanvasEffect>,
	) {
		let effects = {
			let mut slot = self.engine.borrow_mut();
			let Some(engine) = slot.as_mut() else {
				return;
			};
			let effects = f(&mut engine.state, &mut engine.ctx);
			render(&mut engine.state, &mut engine.ctx);
			effects
		};
		self.apply(effects);
	}

	fn apply(self: &Rc<Self>, effects: Vec<CanvasEffect>) {
		for effect in effects {
			match effect {
				CanvasEffect::SetCursor(cursor) => self.view.cursor.set(cursor.as_css()),
				CanvasEffect::ScheduleSave => {
					self.saves.borrow_mut().request();
					self.arm();
				}
				CanvasEffect::MenuChanged => {
					let menu = self
						.engine
						.borrow()
						.as_ref()
						.map(|engine| engine.state.menu.clone())
						.unwrap_or_default();
					self.view.menu.set(menu);
				}
				CanvasEffect::RequestNode { .. } => self.prompt_for_node(),
			}
		}
	}

	fn prompt_for_node(self: &Rc<Self>) {
		let Some(window) = web_sys::window() else {
			return;
		};
		match window.prompt_with_message("Service name") {
			Ok(Some(label)) if !label.trim().is_empty() => self.dispatch(|state, _| {
				state
					.create_node(label.trim(), ServiceDefinition::default())
					.1
			}),
			Ok(_) => debug!("node creation cancelled"),
			Err(err) => error!("prompt failed: {err:?}"),
		}
	}

	/// Replace the pending timer with one for the scheduler's next deadline.
	fn arm(self: &Rc<Self>) {
		if let Some(handle) = self.timer.take() {
			handle.clear();
		}
		let Some(delay) = self.saves.borrow().next_delay_ms() else {
			return;
		};
		let host = Rc::clone(self);
		match set_timeout_with_handle(
			move || host.on_timer(),
			Duration::from_millis(delay.ceil() as u64),
		) {
			Ok(handle) => self.timer.set(Some(handle)),
			Err(err) => error!("failed to arm autosave timer: {err:?}"),
		}
	}

	fn on_timer(self: &Rc<Self>) {
		self.timer.set(None);
		let event = self.saves.borrow_mut().poll();
		self.handle_save_event(event);
		self.arm();
	}

	fn handle_save_event(self: &Rc<Self>, event: Option<SaveEvent>) {
		match event {
			Some(SaveEvent::Fire) => {
				self.view.saving.set(true);
				self.persist();
			}
			Some(SaveEvent::HideIndicator) => self.view.saving.set(false),
			None => {}
		}
	}

	fn persist(self: &Rc<Self>) {
		let snapshot = {
			let engine = self.engine.borrow();
			let Some(engine) = engine.as_ref() else {
				return;
			};
			let mut project = self.project.borrow_mut();
			project.graph = engine.state.snapshot();
			project.touch();
			project.clone()
		};
		let host = Rc::clone(self);
		spawn_local(async move {
			host.client.save_project(&snapshot).await;
			let event = host.saves.borrow_mut().complete();
			host.handle_save_event(event);
			host.arm();
		});
	}

	/// Replaces any previous resize listener with `callback`.
	fn listen_resize(&self, window: &Window, callback: Closure<dyn FnMut()>) {
		self.unlisten_resize(window);
		let _ = window.add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref());
		*self.resize.borrow_mut() = Some(callback);
	}

	fn unlisten_resize(&self, window: &Window) {
		if let Some(callback) = self.resize.borrow_mut().take() {
			let _ = window
				.remove_event_listener_with_callback("resize", callback.as_ref().unchecked_ref());
		}
	}

	fn shutdown(&self) {
		if let Some(handle) = self.timer.take() {
			handle.clear();
		}
		if let Some(window) = web_sys::window() {
			self.unlisten_resize(&window);
		}
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|w| w.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|h| h.as_f64())
			.unwrap_or(600.0),
	)
}

/// Pointer position relative to the canvas' top-left corner.
fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Infinite-canvas editor for one project. Changes are saved through
/// `client` after the autosave quiet period.
#[component]
pub fn DiagramCanvas<S>(
	project: Project,
	client: Rc<ProjectClient<S>>,
	#[prop(optional)] config: CanvasConfig,
	#[prop(optional)] autosave: AutosaveConfig,
	#[prop(default = true)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView
where
	S: ProjectStore + 'static,
{
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let view = CanvasView {
		cursor: RwSignal::new("default"),
		menu: RwSignal::new(ContextMenu::default()),
		saving: RwSignal::new(false),
		error: RwSignal::new(None),
	};
	let host = Rc::new(CanvasHost {
		engine: RefCell::new(None),
		project: RefCell::new(project),
		config,
		saves: RefCell::new(SaveScheduler::new(BrowserClock, autosave)),
		timer: Cell::new(None),
		resize: RefCell::new(None),
		client,
		view,
	});

	let host_init = host.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("2d canvas context unavailable");
			return;
		};
		host_init.mount(ctx, w, h);

		if fullscreen {
			let (host_resize, canvas_resize) = (host_init.clone(), canvas.clone());
			let on_resize = Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				host_resize.dispatch(|state, _| {
					state.resize(nw, nh);
					Vec::new()
				});
			});
			host_init.listen_resize(&window, on_resize);
		}
	});

	let host_store = StoredValue::new_local(host.clone());
	on_cleanup(move || {
		if let Some(host) = host_store.try_get_value() {
			host.shutdown();
		}
	});

	let host_md = host.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		let button = Button::from_dom(ev.button());
		host_md.dispatch(|state, ctx| state.on_pointer_down(ctx, p, button));
	};

	let host_mm = host.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		host_mm.dispatch(|state, ctx| state.on_pointer_move(ctx, p));
	};

	let host_mu = host.clone();
	let on_mouseup = move |_: MouseEvent| {
		host_mu.dispatch(|state, _| state.on_pointer_up());
	};

	let host_ml = host.clone();
	let on_mouseleave = move |_: MouseEvent| {
		host_ml.dispatch(|state, _| state.on_pointer_leave());
	};

	let host_wh = host.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		let delta = ev.delta_y();
		host_wh.dispatch(|state, _| state.on_wheel(p, delta));
	};

	let host_cm = host;
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some(p) = pointer(canvas_ref, &ev) else {
			return;
		};
		host_cm.dispatch(|state, ctx| state.on_context_menu(ctx, p));
	};

	let run = move |command: CanvasCommand| {
		host_store
			.get_value()
			.dispatch(|state, _| state.run_command(command));
	};

	view! {
		<div class="diagram-canvas" class:fullscreen=fullscreen>
			<canvas
				node_ref=canvas_ref
				class="diagram-canvas-surface"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:contextmenu=on_contextmenu
				style:display="block"
				style:cursor=move || view.cursor.get()
			/>
			<ul
				class="context-menu"
				class:hidden=move || !view.menu.with(ContextMenu::is_visible)
				style:left=move || format!("{}px", view.menu.with(|m| m.anchor().x))
				style:top=move || format!("{}px", view.menu.with(|m| m.anchor().y))
			>
				{move || {
					view.menu
						.with(|m| m.actions().to_vec())
						.into_iter()
						.map(|action| {
							let command = action.command;
							view! {
								<li class="menu-action" on:click=move |_| run(command.clone())>
									{action.name}
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
			{move || view.saving.get().then(|| view! { <div class="saving-indicator">"Saving..."</div> })}
			{move || view.error.get().map(|message| view! { <p class="canvas-error">{message}</p> })}
		</div>
	}
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
	use super::*;
	use crate::store::MemoryStore;
	use wasm_bindgen_test::*;

	wasm_bindgen_test_configure!(run_in_browser);

	fn host() -> CanvasHost<MemoryStore> {
		CanvasHost {
			engine: RefCell::new(None),
			project: RefCell::new(Project::new("test")),
			config: CanvasConfig::default(),
			saves: RefCell::new(SaveScheduler::new(BrowserClock, AutosaveConfig::default())),
			timer: Cell::new(None),
			resize: RefCell::new(None),
			client: Rc::new(ProjectClient::new(MemoryStore::new())),
			view: CanvasView {
				cursor: RwSignal::new("default"),
				menu: RwSignal::new(ContextMenu::default()),
				saving: RwSignal::new(false),
				error: RwSignal::new(None),
			},
		}
	}

	fn fire_resize(window: &Window) {
		let event = web_sys::Event::new("resize").unwrap();
		window.dispatch_event(&event).unwrap();
	}

	#[wasm_bindgen_test]
	fn shutdown_detaches_the_resize_listener() {
		let window = web_sys::window().unwrap();
		let host = host();
		let calls = Rc::new(Cell::new(0));

		let counter = calls.clone();
		host.listen_resize(&window, Closure::new(move || counter.set(counter.get() + 1)));
		fire_resize(&window);
		assert_eq!(calls.get(), 1);

		host.shutdown();
		fire_resize(&window);
		assert_eq!(calls.get(), 1);
		assert!(host.resize.borrow().is_none());
	}

	#[wasm_bindgen_test]
	fn relistening_replaces_the_previous_listener() {
		let window = web_sys::window().unwrap();
		let host = host();
		let calls = Rc::new(Cell::new(0));

		for _ in 0..2 {
			let counter = calls.clone();
			host.listen_resize(&window, Closure::new(move || counter.set(counter.get() + 1)));
		}
		fire_resize(&window);
		assert_eq!(calls.get(), 1);
		host.shutdown();
	}
}
