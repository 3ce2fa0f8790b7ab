use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use crate::components::circle_pack::{CirclePackCanvas, Datum};

/// Generate a sample hierarchy: a few groups of leaves with varied sizes.
fn generate_sample_data(groups: usize, leaves: usize) -> Datum {
	let children = (0..groups)
		.map(|g| {
			let items = (0..leaves)
				.map(|i| {
					let mut leaf = Datum::leaf(
						format!("Item {}.{}", g, i),
						1.0 + (rand_simple(g * leaves + i) * 20.0).floor(),
					);
					leaf.id = Some((g * leaves + i) as u64);
					leaf
				})
				.collect();
			Datum::branch(format!("Group {}", g), items)
		})
		.collect();
	Datum::branch("All", children)
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Load a dataset from a script element with id="circle-pack-data".
fn load_dataset() -> Option<Datum> {
	let document = web_sys::window()?.document()?;
	let element = document.get_element_by_id("circle-pack-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match Datum::from_json(&json_text) {
		Ok(data) => {
			info!("circle pack: loaded dataset {:?}", data.name);
			Some(data)
		}
		Err(e) => {
			warn!("circle pack: {e}; using sample data");
			None
		}
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let dataset = load_dataset().unwrap_or_else(|| generate_sample_data(6, 12));
	let data = Signal::derive(move || dataset.clone());

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

			<div class="fullscreen-graph">
				<CirclePackCanvas data=data fullscreen=true />
				<div class="graph-overlay">
					<h1>"Circle Packing"</h1>
					<p class="subtitle">"Click a circle to zoom in. Click it again to zoom back out."</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
