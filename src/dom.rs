use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;

static SELECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z][\w-]*)?(?:#([\w-]+))?((?:\.[\w-]+)*)$").unwrap());

/// A document node: either a text fragment or an element with children.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            Node::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Node::Text(_) => None,
        }
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Concatenated descendant text in document order, outer whitespace trimmed.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Compound simple selector: optional tag, optional #id, any number of .class.
/// Covers everything the extractor asks for; combinators are unsupported.
#[derive(Debug, Clone)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Selector> {
        let input = input.trim();
        let Some(caps) = SELECTOR_RE.captures(input) else {
            bail!("Unsupported selector: {:?}", input);
        };
        let tag = caps.get(1).map(|m| m.as_str().to_string());
        let id = caps.get(2).map(|m| m.as_str().to_string());
        let classes: Vec<String> = caps[3]
            .split('.')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if tag.is_none() && id.is_none() && classes.is_empty() {
            bail!("Empty selector");
        }
        Ok(Selector { tag, id, classes })
    }

    pub fn matches(&self, node: &Node) -> bool {
        let Node::Element { tag, .. } = node else {
            return false;
        };
        if let Some(want) = &self.tag {
            if want != tag {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if node.attr("id") != Some(want.as_str()) {
                return false;
            }
        }
        self.classes
            .iter()
            .all(|want| node.classes().any(|c| c == want))
    }
}

/// Page-query capability consumed by the extractor. The page is always passed
/// in explicitly so tests can run against synthetic trees.
pub trait PageQuery {
    /// First match in document order, returned with its ancestor path
    /// (root first, match last).
    fn query<'a>(&'a self, selector: &Selector) -> Option<Vec<&'a Node>>;

    /// All matches under `scope`, in document order. `scope` itself is not
    /// considered a match.
    fn query_all<'a>(&'a self, selector: &Selector, scope: &'a Node) -> Vec<&'a Node>;
}

/// Nearest ancestor with the given tag, from a path as returned by `query`.
pub fn closest_ancestor<'a>(path: &[&'a Node], tag: &str) -> Option<&'a Node> {
    path.iter().rev().skip(1).find(|n| n.tag() == Some(tag)).copied()
}

/// A parsed page owning its node tree.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parse live HTML into the node tree. Comments, doctypes and processing
    /// instructions are discarded.
    pub fn parse(html: &str) -> Document {
        let parsed = scraper::Html::parse_document(html);
        let root = parsed
            .tree
            .root()
            .children()
            .filter_map(convert)
            .find(|n| matches!(n, Node::Element { .. }))
            .unwrap_or(Node::Element {
                tag: "html".to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
            });
        Document { root }
    }

    /// Wrap a synthetic tree, for tests and callers that already have nodes.
    pub fn from_root(root: Node) -> Document {
        Document { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}

impl PageQuery for Document {
    fn query<'a>(&'a self, selector: &Selector) -> Option<Vec<&'a Node>> {
        let mut path = Vec::new();
        if find_first(&self.root, selector, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn query_all<'a>(&'a self, selector: &Selector, scope: &'a Node) -> Vec<&'a Node> {
        let mut out = Vec::new();
        if let Node::Element { children, .. } = scope {
            for child in children {
                collect_matches(child, selector, &mut out);
            }
        }
        out
    }
}

fn find_first<'a>(node: &'a Node, selector: &Selector, path: &mut Vec<&'a Node>) -> bool {
    path.push(node);
    if selector.matches(node) {
        return true;
    }
    if let Node::Element { children, .. } = node {
        for child in children {
            if find_first(child, selector, path) {
                return true;
            }
        }
    }
    path.pop();
    false
}

fn collect_matches<'a>(node: &'a Node, selector: &Selector, out: &mut Vec<&'a Node>) {
    if selector.matches(node) {
        out.push(node);
    }
    if let Node::Element { children, .. } = node {
        for child in children {
            collect_matches(child, selector, out);
        }
    }
}

fn convert(node: ego_tree::NodeRef<'_, scraper::node::Node>) -> Option<Node> {
    match node.value() {
        scraper::node::Node::Text(t) => Some(Node::Text(t.text.to_string())),
        scraper::node::Node::Element(el) => Some(Node::Element {
            tag: el.name().to_string(),
            attrs: el
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: node.children().filter_map(convert).collect(),
        }),
        _ => None,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<Node>) -> Node {
        Node::Element {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn selector_tag_id() {
        let sel = Selector::parse("div#experience").unwrap();
        assert!(sel.matches(&el("div", &[("id", "experience")], vec![])));
        assert!(!sel.matches(&el("div", &[("id", "education")], vec![])));
        assert!(!sel.matches(&el("span", &[("id", "experience")], vec![])));
    }

    #[test]
    fn selector_classes() {
        let sel = Selector::parse("div.text-body-medium.break-words").unwrap();
        assert!(sel.matches(&el(
            "div",
            &[("class", "text-body-medium break-words extra")],
            vec![]
        )));
        assert!(!sel.matches(&el("div", &[("class", "text-body-medium")], vec![])));
    }

    #[test]
    fn selector_class_only() {
        let sel = Selector::parse(".text-heading-xlarge").unwrap();
        assert!(sel.matches(&el("h1", &[("class", "text-heading-xlarge")], vec![])));
    }

    #[test]
    fn selector_rejects_combinators() {
        assert!(Selector::parse("section > div").is_err());
        assert!(Selector::parse("").is_err());
    }

    #[test]
    fn selector_never_matches_text() {
        let sel = Selector::parse("div").unwrap();
        assert!(!sel.matches(&text("div")));
    }

    #[test]
    fn query_returns_ancestor_path() {
        let target = el("div", &[("id", "experience")], vec![]);
        let root = el(
            "body",
            &[],
            vec![el("section", &[], vec![target.clone()])],
        );
        let doc = Document::from_root(root);
        let sel = Selector::parse("div#experience").unwrap();
        let path = doc.query(&sel).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].tag(), Some("body"));
        assert_eq!(path[1].tag(), Some("section"));
        assert_eq!(path[2].attr("id"), Some("experience"));
        assert_eq!(closest_ancestor(&path, "section").unwrap().tag(), Some("section"));
        assert!(closest_ancestor(&path, "article").is_none());
    }

    #[test]
    fn query_miss_is_none() {
        let doc = Document::from_root(el("body", &[], vec![]));
        let sel = Selector::parse("div#experience").unwrap();
        assert!(doc.query(&sel).is_none());
    }

    #[test]
    fn query_all_document_order() {
        let root = el(
            "ul",
            &[],
            vec![
                el("li", &[("class", "artdeco-list__item"), ("id", "a")], vec![]),
                el("li", &[("class", "other")], vec![]),
                el("li", &[("class", "artdeco-list__item"), ("id", "b")], vec![]),
            ],
        );
        let doc = Document::from_root(root);
        let sel = Selector::parse("li.artdeco-list__item").unwrap();
        let items = doc.query_all(&sel, doc.root());
        let ids: Vec<_> = items.iter().map(|n| n.attr("id").unwrap()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let node = el(
            "span",
            &[],
            vec![text(" Jane "), el("b", &[], vec![text("Doe")]), text(" ")],
        );
        assert_eq!(node.text_content(), "Jane Doe");
    }

    #[test]
    fn parse_html_roundtrip() {
        let doc = Document::parse(
            r#"<html><body><h1 class="text-heading-xlarge">Jane Doe</h1></body></html>"#,
        );
        let sel = Selector::parse(".text-heading-xlarge").unwrap();
        let path = doc.query(&sel).unwrap();
        assert_eq!(path.last().unwrap().text_content(), "Jane Doe");
    }

    #[test]
    fn parse_html_drops_comments() {
        let doc = Document::parse("<html><body><!-- hidden --><p>visible</p></body></html>");
        let sel = Selector::parse("p").unwrap();
        let path = doc.query(&sel).unwrap();
        assert_eq!(path.last().unwrap().text_content(), "visible");
    }
}
