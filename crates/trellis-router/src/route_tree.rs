use crate::instruction::{InstructionTree, ViewportInstruction};
use trellis_core::{Params, RouteSnapshot};

/// One routed component in the active tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteNode {
    /// Name of the routed component.
    pub component: String,
    /// The pattern that matched; empty for fallbacks.
    pub pattern: String,
    /// The path segments the route consumed.
    pub path: String,
    pub params: Params,
    /// Name of the viewport hosting the component.
    pub viewport: String,
    /// Whether the instruction named the viewport explicitly.
    pub explicit_viewport: bool,
    pub title: Option<String>,
    /// The instruction this node was resolved from.
    pub instruction: ViewportInstruction,
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn snapshot(&self, query: &Params, fragment: Option<&str>) -> RouteSnapshot {
        RouteSnapshot {
            pattern: self.pattern.clone(),
            path: self.path.clone(),
            component: self.component.clone(),
            params: self.params.clone(),
            query: query.clone(),
            fragment: fragment.map(str::to_owned),
            viewport: self.viewport.clone(),
            title: self.title.clone(),
        }
    }

    fn url_segment(&self) -> String {
        let mut own = self.path.clone();
        if self.explicit_viewport && !own.is_empty() {
            own.push('@');
            own.push_str(&self.viewport);
        }
        let children = join_nodes(&self.children);
        match (own.is_empty(), children.is_empty()) {
            (_, true) => own,
            (true, false) => children,
            (false, false) if self.children.len() == 1 => format!("{own}/{children}"),
            (false, false) => format!("{own}/({children})"),
        }
    }

    fn collect_titles(&self, titles: &mut Vec<String>) {
        for child in &self.children {
            child.collect_titles(titles);
        }
        if let Some(title) = &self.title {
            titles.push(title.clone());
        }
    }
}

fn join_nodes(nodes: &[RouteNode]) -> String {
    nodes
        .iter()
        .map(RouteNode::url_segment)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("+")
}

/// Snapshot of every routed component that is currently shown.
///
/// The router swaps its tree in a single assignment once a transition has
/// settled, so readers never observe a partially applied navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTree {
    /// The instructions that produced this tree.
    pub instructions: InstructionTree,
    pub children: Vec<RouteNode>,
}

impl RouteTree {
    /// The canonical path of the tree, without a leading `/`.
    pub fn path(&self) -> String {
        let mut path = join_nodes(&self.children);
        let query = &self.instructions.query;
        if !query.is_empty() {
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            path.push('?');
            path.push_str(&pairs.join("&"));
        }
        if let Some(fragment) = &self.instructions.fragment {
            path.push('#');
            path.push_str(fragment);
        }
        path
    }

    /// Route titles from the deepest node up, siblings in order.
    pub fn titles(&self) -> Vec<String> {
        let mut titles = Vec::new();
        for node in &self.children {
            node.collect_titles(&mut titles);
        }
        titles
    }

    /// Every node in pre-order.
    pub fn nodes(&self) -> Vec<&RouteNode> {
        fn walk<'a>(node: &'a RouteNode, out: &mut Vec<&'a RouteNode>) {
            out.push(node);
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        for node in &self.children {
            walk(node, &mut out);
        }
        out
    }

    pub fn find(&self, component: &str) -> Option<&RouteNode> {
        self.nodes().into_iter().find(|node| node.component == component)
    }
}
