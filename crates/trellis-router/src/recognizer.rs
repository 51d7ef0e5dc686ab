//! Path recognizer: a trie over path segments.
//!
//! Route patterns are `/`-separated segments of four kinds:
//!
//! | Segment | Matches |
//! |---------|---------|
//! | `users` | exactly that segment (case-insensitive unless the route opts in) |
//! | `:id` | any single segment, captured as `id` |
//! | `:id?` | any single segment, or nothing |
//! | `*rest` | every remaining segment, captured joined by `/` |
//!
//! At each segment the recognizer prefers static over dynamic over
//! optional over catch-all edges.  When no edge matches the remaining path,
//! a route ending at the current node may still match the consumed prefix,
//! leaving the rest as *residue* for child routing.  The empty route never
//! takes a residue.

use crate::error::RecognizerError;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Dynamic(String),
    Optional(String),
    Star(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKind {
    Dynamic,
    Optional,
    Star,
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RecognizerError> {
    let segments: Vec<&str> = split_path(pattern).collect();
    let mut parsed = Vec::with_capacity(segments.len());
    for (index, raw) in segments.iter().enumerate() {
        let segment = if let Some(name) = raw.strip_prefix(':') {
            match name.strip_suffix('?') {
                Some(name) => Segment::Optional(name.to_owned()),
                None => Segment::Dynamic(name.to_owned()),
            }
        } else if let Some(name) = raw.strip_prefix('*') {
            if index + 1 != segments.len() {
                return Err(RecognizerError::StarNotLast {
                    pattern: pattern.to_owned(),
                });
            }
            Segment::Star(name.to_owned())
        } else {
            Segment::Static((*raw).to_owned())
        };
        if let Segment::Dynamic(name) | Segment::Optional(name) = &segment {
            if name.is_empty() {
                return Err(RecognizerError::EmptyParameter {
                    pattern: pattern.to_owned(),
                });
            }
        }
        parsed.push(segment);
    }
    Ok(parsed)
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Shape key used to detect duplicate patterns: parameter names do not
/// distinguish two routes.
fn shape(segments: &[Segment], case_sensitive: bool) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Static(value) if case_sensitive => value.clone(),
            Segment::Static(value) => value.to_lowercase(),
            Segment::Dynamic(_) => ":".to_owned(),
            Segment::Optional(_) => ":?".to_owned(),
            Segment::Star(_) => "*".to_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Default)]
struct Node {
    statics: HashMap<String, usize>,
    folded: HashMap<String, usize>,
    dynamic: Option<usize>,
    optional: Option<usize>,
    star: Option<usize>,
    terminals: Vec<Terminal>,
}

/// A route ending at a node, with the names of the values captured on the
/// way there.
#[derive(Debug, Clone)]
struct Terminal {
    endpoint: usize,
    params: Vec<String>,
}

#[derive(Debug)]
struct Endpoint<T> {
    pattern: String,
    handler: T,
    empty: bool,
}

/// The result of a successful [`RouteRecognizer::recognize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedRoute<'a, T> {
    pub handler: &'a T,
    /// The pattern as registered.
    pub pattern: &'a str,
    pub params: BTreeMap<String, String>,
    /// Unmatched trailing segments, joined by `/`.
    pub residue: Option<String>,
    /// Number of path segments the route consumed.
    pub consumed: usize,
}

/// Maps path patterns to handlers.
#[derive(Debug)]
pub struct RouteRecognizer<T> {
    nodes: Vec<Node>,
    endpoints: Vec<Endpoint<T>>,
    shapes: HashMap<String, String>,
}

impl<T> Default for RouteRecognizer<T> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            endpoints: Vec::new(),
            shapes: HashMap::new(),
        }
    }
}

impl<T> RouteRecognizer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Register `pattern`.  Fails if a route of the same shape exists.
    pub fn add(&mut self, pattern: &str, handler: T, case_sensitive: bool) -> Result<(), RecognizerError> {
        let segments = parse_pattern(pattern)?;
        let key = shape(&segments, case_sensitive);
        if let Some(existing) = self.shapes.get(&key) {
            return Err(RecognizerError::Ambiguous {
                pattern: pattern.to_owned(),
                existing: existing.clone(),
            });
        }
        self.shapes.insert(key, pattern.to_owned());

        let endpoint = self.endpoints.len();
        self.endpoints.push(Endpoint {
            pattern: pattern.to_owned(),
            handler,
            empty: segments.is_empty(),
        });

        // Each optional segment doubles the variants: present or skipped.
        let mut variants: Vec<(usize, Vec<String>)> = vec![(0, Vec::new())];
        for segment in &segments {
            let mut next = Vec::with_capacity(variants.len() * 2);
            for (node, params) in variants {
                match segment {
                    Segment::Static(value) => {
                        let child = self.static_child(node, value, case_sensitive);
                        next.push((child, params));
                    }
                    Segment::Dynamic(name) => {
                        let child = self.edge_child(node, EdgeKind::Dynamic);
                        next.push((child, [params, vec![name.clone()]].concat()));
                    }
                    Segment::Optional(name) => {
                        let child = self.edge_child(node, EdgeKind::Optional);
                        next.push((child, [params.clone(), vec![name.clone()]].concat()));
                        next.push((node, params));
                    }
                    Segment::Star(name) => {
                        let child = self.edge_child(node, EdgeKind::Star);
                        next.push((child, [params, vec![name.clone()]].concat()));
                    }
                }
            }
            variants = next;
        }
        for (node, params) in variants {
            self.nodes[node].terminals.push(Terminal { endpoint, params });
        }
        Ok(())
    }

    fn push_node(&mut self) -> usize {
        self.nodes.push(Node::default());
        self.nodes.len() - 1
    }

    fn static_child(&mut self, node: usize, value: &str, case_sensitive: bool) -> usize {
        let key = if case_sensitive {
            value.to_owned()
        } else {
            value.to_lowercase()
        };
        let existing = if case_sensitive {
            self.nodes[node].statics.get(&key).copied()
        } else {
            self.nodes[node].folded.get(&key).copied()
        };
        if let Some(child) = existing {
            return child;
        }
        let child = self.push_node();
        if case_sensitive {
            self.nodes[node].statics.insert(key, child);
        } else {
            self.nodes[node].folded.insert(key, child);
        }
        child
    }

    fn edge_child(&mut self, node: usize, kind: EdgeKind) -> usize {
        let existing = match kind {
            EdgeKind::Dynamic => self.nodes[node].dynamic,
            EdgeKind::Optional => self.nodes[node].optional,
            EdgeKind::Star => self.nodes[node].star,
        };
        if let Some(child) = existing {
            return child;
        }
        let child = self.push_node();
        match kind {
            EdgeKind::Dynamic => self.nodes[node].dynamic = Some(child),
            EdgeKind::Optional => self.nodes[node].optional = Some(child),
            EdgeKind::Star => self.nodes[node].star = Some(child),
        }
        child
    }

    /// Find the best route for `path`.  Pure; safe to call speculatively.
    pub fn recognize(&self, path: &str) -> Option<RecognizedRoute<'_, T>> {
        let segments: Vec<&str> = split_path(path).collect();
        let mut captures = Vec::new();
        let found = self.search(0, &segments, 0, &mut captures)?;
        let endpoint = &self.endpoints[found.terminal.endpoint];
        let params = found
            .terminal
            .params
            .iter()
            .cloned()
            .zip(found.captures)
            .collect();
        let residue = (found.consumed < segments.len()).then(|| segments[found.consumed..].join("/"));
        Some(RecognizedRoute {
            handler: &endpoint.handler,
            pattern: &endpoint.pattern,
            params,
            residue,
            consumed: found.consumed,
        })
    }

    fn search(&self, node: usize, segments: &[&str], index: usize, captures: &mut Vec<String>) -> Option<Found> {
        let current = &self.nodes[node];
        if index == segments.len() {
            if let Some(terminal) = current.terminals.first() {
                return Some(Found::new(terminal, captures, index));
            }
            // A catch-all also matches nothing.
            if let Some(star) = current.star {
                if let Some(terminal) = self.nodes[star].terminals.first() {
                    captures.push(String::new());
                    let found = Found::new(terminal, captures, index);
                    captures.pop();
                    return Some(found);
                }
            }
            return None;
        }

        let segment = segments[index];
        let exact = current.statics.get(segment).copied();
        let folded = current.folded.get(&segment.to_lowercase()).copied();
        for child in [exact, folded].into_iter().flatten() {
            if let Some(found) = self.search(child, segments, index + 1, captures) {
                return Some(found);
            }
        }
        for child in [current.dynamic, current.optional].into_iter().flatten() {
            captures.push(segment.to_owned());
            let found = self.search(child, segments, index + 1, captures);
            captures.pop();
            if found.is_some() {
                return found;
            }
        }
        if let Some(star) = current.star {
            if let Some(terminal) = self.nodes[star].terminals.first() {
                captures.push(segments[index..].join("/"));
                let found = Found::new(terminal, captures, segments.len());
                captures.pop();
                return Some(found);
            }
        }
        current
            .terminals
            .iter()
            .find(|terminal| !self.endpoints[terminal.endpoint].empty)
            .map(|terminal| Found::new(terminal, captures, index))
    }
}

struct Found {
    terminal: Terminal,
    captures: Vec<String>,
    consumed: usize,
}

impl Found {
    fn new(terminal: &Terminal, captures: &[String], consumed: usize) -> Self {
        Self {
            terminal: terminal.clone(),
            captures: captures.to_vec(),
            consumed,
        }
    }
}
