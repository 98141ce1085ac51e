use std::collections::HashSet;

use crate::assemble::build_scene;
use crate::config::Config;
use crate::ir::DiagramInput;
use crate::scene::{Element, Scene};

/// Horizontal gap between an existing drawing and appended elements.
pub const MERGE_GAP: f64 = 100.0;

/// Assembles `additions` and appends them to the right of `existing`.
pub fn merge_scenes(existing: &Scene, additions: &DiagramInput, config: &Config) -> Scene {
    let fresh = build_scene(additions, config);
    merge_elements(existing, fresh)
}

/// Appends `fresh`'s elements after `existing`'s, shifted right so the new
/// group's left edge sits `MERGE_GAP` past the existing bounding box.
/// Everything but the element list is taken from `existing`.
pub fn merge_elements(existing: &Scene, fresh: Scene) -> Scene {
    let (_, _, existing_max_x, _) = existing.bounds();
    let (fresh_min_x, _, _, _) = fresh.bounds();
    let offset = existing_max_x + MERGE_GAP - fresh_min_x;

    let known: HashSet<&str> = existing.elements.iter().map(Element::id).collect();
    let mut merged = existing.clone();
    merged.elements.reserve(fresh.elements.len());
    for mut element in fresh.elements {
        if known.contains(element.id()) {
            tracing::warn!(id = %element.id(), "merged element id already present in drawing");
        }
        element.translate(offset, 0.0);
        merged.elements.push(element);
    }

    tracing::debug!(
        offset,
        existing = existing.elements.len(),
        total = merged.elements.len(),
        "merged scenes"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Direction, Edge, Node};
    use crate::scene::AppState;

    fn user_server() -> DiagramInput {
        let mut input = DiagramInput::new(Direction::LeftRight);
        input.nodes = vec![Node::new("u", "User"), Node::new("s", "Server")];
        input.edges = vec![Edge::new("u", "s").with_label("HTTP")];
        input
    }

    #[test]
    fn merging_a_scene_with_itself_doubles_it() {
        let config = Config::default();
        let existing = build_scene(&user_server(), &config);
        let (_, _, max_x, _) = existing.bounds();
        assert_eq!(max_x, 400.0);

        let merged = merge_scenes(&existing, &user_server(), &config);
        assert_eq!(merged.elements.len(), 12);
        assert_eq!(&merged.elements[..6], &existing.elements[..]);

        let second_u = merged
            .elements
            .iter()
            .skip(6)
            .find(|element| element.id() == "u")
            .unwrap();
        assert_eq!(second_u.base().x, max_x + MERGE_GAP);
        assert!(merged.elements[6..]
            .iter()
            .all(|element| element.bounds().0 >= max_x + MERGE_GAP));
    }

    #[test]
    fn vertical_positions_are_untouched() {
        let config = Config::default();
        let existing = build_scene(&user_server(), &config);
        let fresh = build_scene(&user_server(), &config);
        let ys: Vec<f64> = fresh.elements.iter().map(|e| e.base().y).collect();
        let merged = merge_elements(&existing, fresh);
        let merged_ys: Vec<f64> = merged.elements[6..].iter().map(|e| e.base().y).collect();
        assert_eq!(ys, merged_ys);
    }

    #[test]
    fn drawings_with_foreign_elements_still_merge() {
        let existing: Scene = serde_json::from_value(serde_json::json!({
            "type": "excalidraw",
            "version": 2,
            "source": "https://excalidraw.com",
            "elements": [
                {"type": "freedraw", "id": "scribble", "x": 0, "y": 0, "width": 250, "height": 80,
                 "points": [[0, 0], [250, 80]], "pressures": []},
                {"type": "arrow", "id": "rel", "x": 0, "y": 100, "width": 300, "height": 0,
                 "points": [[0, 0], [300, 0]], "endArrowhead": "crowfoot_many"}
            ],
            "appState": {"viewBackgroundColor": "#ffffff"}
        }))
        .unwrap();

        let merged = merge_scenes(&existing, &user_server(), &Config::default());
        assert_eq!(merged.elements.len(), 8);
        assert_eq!(&merged.elements[..2], &existing.elements[..]);
        assert_eq!(merged.elements[0].type_name(), "freedraw");
        assert_eq!(merged.element("u").unwrap().base().x, 300.0 + MERGE_GAP);

        let written = serde_json::to_value(&merged).unwrap();
        assert_eq!(written["elements"][0]["pressures"], serde_json::json!([]));
        assert_eq!(written["elements"][1]["endArrowhead"], "crowfoot_many");
    }

    #[test]
    fn empty_existing_scene_places_after_the_gap() {
        let config = Config::default();
        let mut existing = Scene::new("vault", AppState::new("#123456"));
        existing.app_state.grid_size = Some(20.0);
        let merged = merge_scenes(&existing, &user_server(), &config);
        assert_eq!(merged.elements.len(), 6);
        assert_eq!(merged.element("u").unwrap().base().x, MERGE_GAP);
        assert_eq!(merged.source, "vault");
        assert_eq!(merged.app_state.view_background_color, "#123456");
        assert_eq!(merged.app_state.grid_size, Some(20.0));
    }
}
