//! Templates and the compiler contract.
//!
//! A [`Template`] is a tree of plain [`TemplateNode`]s.  Compiling it
//! against a [`Container`] resolves tags and attribute names to registered
//! components and yields the [`Instruction`] list the renderer consumes.

use crate::container::Container;
use crate::definition::{ComponentDefinition, DefinitionId, DefinitionKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<TemplateNode>,
    },
    Text(String),
}

impl TemplateNode {
    pub fn element(tag: impl Into<String>) -> Self {
        TemplateNode::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        TemplateNode::Text(content.into())
    }

    /// Add an attribute.  No-op on text nodes.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let TemplateNode::Element { attributes, .. } = &mut self {
            attributes.push((name.into(), value.into()));
        }
        self
    }

    /// Append a child.  No-op on text nodes.
    pub fn child(mut self, node: TemplateNode) -> Self {
        if let TemplateNode::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }
}

/// The markup of a component or a synthetic view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<TemplateNode>,
}

impl Template {
    pub fn new(nodes: impl IntoIterator<Item = TemplateNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }
}

/// A custom attribute found on an element.
#[derive(Debug, Clone)]
pub struct AttributeInstruction {
    pub definition: Rc<ComponentDefinition>,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum Instruction {
    Text(String),
    /// A plain element.
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        custom_attributes: Vec<AttributeInstruction>,
        children: Vec<Instruction>,
    },
    /// An element hosting a custom element.  Content placed between the
    /// tags is not projected.
    HydrateElement {
        definition: Rc<ComponentDefinition>,
        attributes: Vec<(String, String)>,
        custom_attributes: Vec<AttributeInstruction>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CompiledTemplate {
    pub instructions: Vec<Instruction>,
}

/// Turns a definition's template into renderer instructions.
pub trait TemplateCompiler {
    fn compile(&self, definition: &ComponentDefinition, container: &Container) -> Rc<CompiledTemplate>;
}

/// Compiler that resolves components through the container and caches
/// the result per definition.
#[derive(Default)]
pub struct DefaultTemplateCompiler {
    cache: RefCell<HashMap<DefinitionId, Rc<CompiledTemplate>>>,
}

impl DefaultTemplateCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl TemplateCompiler for DefaultTemplateCompiler {
    fn compile(&self, definition: &ComponentDefinition, container: &Container) -> Rc<CompiledTemplate> {
        if let Some(compiled) = self.cache.borrow().get(&definition.id()) {
            return compiled.clone();
        }
        let compiled = Rc::new(match definition.template() {
            Some(template) => compile_template(template, container),
            None => CompiledTemplate::default(),
        });
        tracing::trace!(
            component = definition.name(),
            instructions = compiled.instructions.len(),
            "compiled template"
        );
        self.cache
            .borrow_mut()
            .insert(definition.id(), compiled.clone());
        compiled
    }
}

/// Compile a template without caching.
pub fn compile_template(template: &Template, container: &Container) -> CompiledTemplate {
    CompiledTemplate {
        instructions: template
            .nodes()
            .iter()
            .map(|node| compile_node(node, container))
            .collect(),
    }
}

fn compile_node(node: &TemplateNode, container: &Container) -> Instruction {
    match node {
        TemplateNode::Text(content) => Instruction::Text(content.clone()),
        TemplateNode::Element {
            tag,
            attributes,
            children,
        } => {
            let mut plain = Vec::new();
            let mut custom_attributes = Vec::new();
            for (name, value) in attributes {
                match container.find_component(name) {
                    Some(definition) if definition.kind() == DefinitionKind::Attribute => {
                        custom_attributes.push(AttributeInstruction {
                            definition,
                            value: value.clone(),
                        });
                    }
                    _ => plain.push((name.clone(), value.clone())),
                }
            }
            match container.find_component(tag) {
                Some(definition) if definition.kind() == DefinitionKind::Element => {
                    Instruction::HydrateElement {
                        definition,
                        attributes: plain,
                        custom_attributes,
                    }
                }
                _ => Instruction::Element {
                    tag: tag.clone(),
                    attributes: plain,
                    custom_attributes,
                    children: children
                        .iter()
                        .map(|child| compile_node(child, container))
                        .collect(),
                },
            }
        }
    }
}
