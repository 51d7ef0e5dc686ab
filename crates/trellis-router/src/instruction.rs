//! Route instructions and their textual form.
//!
//! ```text
//! home                        one component in the first free viewport
//! users/42                    a path, matched against the route table
//! list@left+detail(id=7)@right  two siblings in named viewports
//! shell/(nav+main)            a parent with two children
//! search?q=rust#results       query and fragment
//! ```
//!
//! `/` binds tighter than `+`, so `a/b+c` loads `a/b` and `c` side by side.

use crate::error::ExpressionError;
use std::fmt;
use std::str::FromStr;
use trellis_core::Params;

/// One component to load into a viewport, with its child instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportInstruction {
    /// Component name or path segment.
    pub component: String,
    /// Parameters given explicitly as `(key=value,...)`.
    pub params: Params,
    /// Viewport given explicitly as `@name`.
    pub viewport: Option<String>,
    pub children: Vec<ViewportInstruction>,
}

impl ViewportInstruction {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn viewport(mut self, viewport: impl Into<String>) -> Self {
        self.viewport = Some(viewport.into());
        self
    }

    pub fn child(mut self, child: ViewportInstruction) -> Self {
        self.children.push(child);
        self
    }

    /// This instruction followed by its only child, that child's only
    /// child and so on, stopping at a child that names a viewport.
    ///
    /// The chain is what the recognizer sees as one path: `users/42/edit`
    /// parses as three nested instructions but matches a single route.
    pub(crate) fn chain(&self) -> Vec<&ViewportInstruction> {
        let mut chain = vec![self];
        let mut node = self;
        while let [only] = node.children.as_slice() {
            if only.viewport.is_some() {
                break;
            }
            chain.push(only);
            node = only;
        }
        chain
    }

    /// The children left over after the first `consumed` links of the
    /// chain were matched by a route.
    pub(crate) fn descend(&self, consumed: usize) -> Vec<ViewportInstruction> {
        let chain = self.chain();
        match consumed {
            0 => self.children.clone(),
            n => chain
                .get(n - 1)
                .map(|last| last.children.clone())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for ViewportInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.component)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "({})", params.join(","))?;
        }
        if let Some(viewport) = &self.viewport {
            write!(f, "@{viewport}")?;
        }
        match self.children.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "/{only}"),
            many => write!(f, "/({})", join_siblings(many)),
        }
    }
}

fn join_siblings(instructions: &[ViewportInstruction]) -> String {
    instructions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("+")
}

/// A parsed navigation request: the root-level instructions plus the
/// query and fragment that apply to the whole navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionTree {
    pub children: Vec<ViewportInstruction>,
    pub query: Params,
    pub fragment: Option<String>,
}

impl InstructionTree {
    pub fn new(children: impl IntoIterator<Item = ViewportInstruction>) -> Self {
        Self {
            children: children.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        Parser::new(expression).tree()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl FromStr for InstructionTree {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstructionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_siblings(&self.children))?;
        if !self.query.is_empty() {
            let pairs: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "?{}", pairs.join("&"))?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

const RESERVED: &[char] = &['/', '+', '(', ')', '@', '?', '#', '=', ',', '&'];

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ExpressionError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.unexpected(found)),
            None => Err(ExpressionError::UnexpectedEnd {
                expression: self.expression.to_owned(),
            }),
        }
    }

    fn unexpected(&self, found: char) -> ExpressionError {
        ExpressionError::Unexpected {
            expression: self.expression.to_owned(),
            position: self.pos,
            found,
        }
    }

    /// Read characters until one of `stops` or the end.
    fn take_until(&mut self, stops: &[char]) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn tree(mut self) -> Result<InstructionTree, ExpressionError> {
        self.eat('/');
        let children = match self.peek() {
            None | Some('?') | Some('#') => Vec::new(),
            Some(_) => self.siblings()?,
        };
        let mut query = Params::new();
        if self.eat('?') {
            loop {
                let key = self.take_until(&['=', '&', '#']);
                let value = if self.eat('=') {
                    self.take_until(&['&', '#'])
                } else {
                    String::new()
                };
                if !key.is_empty() {
                    query.insert(key, value);
                }
                if !self.eat('&') {
                    break;
                }
            }
        }
        let fragment = if self.eat('#') {
            Some(self.take_until(&[]))
        } else {
            None
        };
        if let Some(found) = self.peek() {
            return Err(self.unexpected(found));
        }
        Ok(InstructionTree {
            children,
            query,
            fragment,
        })
    }

    fn siblings(&mut self) -> Result<Vec<ViewportInstruction>, ExpressionError> {
        let mut siblings = self.scoped()?;
        while self.eat('+') {
            siblings.extend(self.scoped()?);
        }
        Ok(siblings)
    }

    fn scoped(&mut self) -> Result<Vec<ViewportInstruction>, ExpressionError> {
        if self.eat('(') {
            let group = self.siblings()?;
            self.expect(')')?;
            Ok(group)
        } else {
            Ok(vec![self.segment()?])
        }
    }

    fn segment(&mut self) -> Result<ViewportInstruction, ExpressionError> {
        let position = self.pos;
        let component = self.take_until(RESERVED);
        if component.is_empty() {
            return Err(match self.peek() {
                Some(found) if found != '/' && found != '+' => self.unexpected(found),
                _ => ExpressionError::MissingComponent {
                    expression: self.expression.to_owned(),
                    position,
                },
            });
        }
        let mut instruction = ViewportInstruction::new(component);
        if self.eat('(') {
            loop {
                let key = self.take_until(RESERVED);
                self.expect('=')?;
                let value = self.take_until(&[',', ')']);
                if key.is_empty() {
                    return Err(ExpressionError::MissingComponent {
                        expression: self.expression.to_owned(),
                        position: self.pos,
                    });
                }
                instruction.params.insert(key, value);
                if !self.eat(',') {
                    break;
                }
            }
            self.expect(')')?;
        }
        if self.eat('@') {
            let viewport = self.take_until(RESERVED);
            if viewport.is_empty() {
                return Err(ExpressionError::MissingComponent {
                    expression: self.expression.to_owned(),
                    position: self.pos,
                });
            }
            instruction.viewport = Some(viewport);
        }
        if self.eat('/') {
            if matches!(self.peek(), None | Some('?') | Some('#') | Some('+') | Some(')')) {
                return Ok(instruction);
            }
            instruction.children = self.scoped()?;
        }
        Ok(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(expression: &str) -> InstructionTree {
        InstructionTree::parse(expression).unwrap()
    }

    #[test]
    fn slash_nests_and_plus_separates() {
        let tree = parse("a/b+c");
        assert_eq!(
            tree.children,
            vec![
                ViewportInstruction::new("a").child(ViewportInstruction::new("b")),
                ViewportInstruction::new("c"),
            ]
        );
    }

    #[test]
    fn groups_give_a_parent_several_children() {
        let tree = parse("shell/(nav@side+main@body)");
        let shell = &tree.children[0];
        assert_eq!(shell.children.len(), 2);
        assert_eq!(shell.children[1].viewport.as_deref(), Some("body"));
    }

    #[test]
    fn explicit_params_viewport_query_and_fragment() {
        let tree = parse("/detail(id=7,tab=info)@$1?q=rust&page=2#top");
        let detail = &tree.children[0];
        assert_eq!(detail.params.get("id").map(String::as_str), Some("7"));
        assert_eq!(detail.params.get("tab").map(String::as_str), Some("info"));
        assert_eq!(detail.viewport.as_deref(), Some("$1"));
        assert_eq!(tree.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(tree.fragment.as_deref(), Some("top"));
    }

    #[test]
    fn empty_expressions_give_an_empty_tree() {
        assert!(parse("").is_empty());
        assert!(parse("/").is_empty());
        assert_eq!(parse("?x=1").query.len(), 1);
    }

    #[test]
    fn display_is_canonical() {
        for expression in ["a/b+c", "shell/(nav@side+main)", "detail(id=7)@$1?q=x#f", "a@$0+b@$1"] {
            assert_eq!(parse(expression).to_string(), expression);
        }
        assert_eq!(parse("/a/b/").to_string(), "a/b");
    }

    #[test]
    fn chain_follows_single_unnamed_children() {
        let tree = parse("users/42/edit@pane/x");
        let chain: Vec<&str> = tree.children[0].chain().iter().map(|vi| vi.component.as_str()).collect();
        assert_eq!(chain, vec!["users", "42"]);
        assert_eq!(tree.children[0].descend(2)[0].component, "edit");
        assert!(tree.children[0].descend(1)[0].component == "42");
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert!(matches!(
            InstructionTree::parse("a/(b+c"),
            Err(ExpressionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            InstructionTree::parse("a++b"),
            Err(ExpressionError::MissingComponent { position: 2, .. })
        ));
        assert!(matches!(
            InstructionTree::parse("a)"),
            Err(ExpressionError::Unexpected { found: ')', .. })
        ));
        assert!(matches!(
            InstructionTree::parse("a(id)"),
            Err(ExpressionError::Unexpected { found: ')', .. })
        ));
    }
}
