use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::debug;

use super::Engine;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub index: usize,
    pub id: String,
    pub score: i64,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl Engine {
    /// Nodes whose label or id fuzzy-matches `query`, best first. Equal
    /// scores keep graph order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query = query.trim();
        let Some(graph) = self.graph() else {
            return Vec::new();
        };
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut hits = graph
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let label_score = node
                    .label
                    .as_deref()
                    .and_then(|label| fuzzy_match_score(&matcher, label, query));
                let id_score = fuzzy_match_score(&matcher, &node.id, query);
                let score = label_score.max(id_score)?;
                Some(SearchHit {
                    index,
                    id: node.id.clone(),
                    score,
                })
            })
            .collect::<Vec<_>>();

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    /// Highlights the node and pans it to the middle of the surface.
    pub fn focus_node(&mut self, id: &str) -> bool {
        let Some(index) = self.graph().and_then(|graph| graph.index_of(id)) else {
            return false;
        };
        let Some(world) = self.node_position(index) else {
            return false;
        };

        self.set_highlight(Some(index));
        let center = self.surface_center();
        if let Err(error) = self.viewport.center_on(world, center) {
            debug!(%error, id, "could not center on node");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::config::EngineConfig;
    use crate::events::EngineEvent;
    use crate::graph::{GraphPayload, Node};

    fn engine_with(nodes: Vec<Node>) -> Engine {
        let mut engine = Engine::new(EngineConfig::default()).expect("config is valid");
        engine
            .load(GraphPayload::new(nodes, Vec::new()))
            .expect("load succeeds");
        engine.drain_events();
        engine
    }

    #[test]
    fn matches_labels_and_ids_case_insensitively() {
        let engine = engine_with(vec![
            Node::new("n1").with_label("Checkout Page"),
            Node::new("about-us"),
            Node::new("n3").with_label("Contact"),
        ]);

        let hits = engine.search("CHECK", 10);
        assert_eq!(hits.first().map(|hit| hit.id.as_str()), Some("n1"));
        let hits = engine.search("about", 10);
        assert_eq!(hits.first().map(|hit| hit.id.as_str()), Some("about-us"));
        assert!(engine.search("zzzz", 10).is_empty());
        assert!(engine.search("   ", 10).is_empty());
    }

    #[test]
    fn limit_and_ties_keep_graph_order() {
        let engine = engine_with(vec![
            Node::new("item-0"),
            Node::new("other-1"),
            Node::new("item-2"),
        ]);

        let hits = engine.search("item", 5);
        assert_eq!(
            hits.iter().map(|hit| hit.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert_eq!(engine.search("item", 1).len(), 1);
    }

    #[test]
    fn focus_highlights_and_centers() {
        let mut engine = engine_with(vec![Node::new("a"), Node::new("b")]);
        assert!(engine.focus_node("b"));

        let world = engine.node_position_by_id("b").expect("node b");
        assert!((engine.viewport().to_screen(world) - pos2(400.0, 300.0)).length() < 1e-3);
        assert_eq!(engine.highlighted_node(), Some("b"));
        assert!(engine.drain_events().contains(&EngineEvent::HighlightChanged {
            id: Some("b".to_owned())
        }));
        assert!(!engine.focus_node("missing"));
    }
}
