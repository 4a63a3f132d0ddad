use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::diagram_canvas::{DiagramCanvas, Project};
use crate::store::{BrowserStore, ProjectClient};

#[derive(Clone, Debug, PartialEq)]
enum Opening {
	Loading,
	Ready(Project),
	Failed,
}

/// Default Home Page: opens the most recently edited project.
#[component]
pub fn Home() -> impl IntoView {
	let client = Rc::new(ProjectClient::new(BrowserStore::open()));
	let opening = RwSignal::new(Opening::Loading);

	let loader = client.clone();
	spawn_local(async move {
		let next = match loader.open_latest().await {
			Some(project) => Opening::Ready(project),
			None => Opening::Failed,
		};
		opening.set(next);
	});

	let client = StoredValue::new_local(client);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="fullscreen-canvas">
				{move || match opening.get() {
					Opening::Loading => view! { <div class="loading-icon">"Loading projects..."</div> }.into_any(),
					Opening::Ready(project) => {
						view! { <DiagramCanvas project=project client=client.get_value() fullscreen=true /> }
							.into_any()
					}
					Opening::Failed => view! {
						<p class="canvas-error">"Could not open or create a project."</p>
					}
						.into_any(),
				}}
			</div>
		</ErrorBoundary>
	}
}
