use crate::container::Container;
use crate::controller::Controller;
use crate::node::HostNode;
use crate::template::{AttributeInstruction, CompiledTemplate, Instruction};

/// Render `compiled` into detached nodes owned by `owner`.
///
/// Every custom element or custom attribute encountered is hydrated with
/// its own child container and added to `owner` as a child controller, in
/// document order with an element's attributes ahead of the element.
pub(crate) fn render(owner: &Controller, compiled: &CompiledTemplate, container: &Container) -> Vec<HostNode> {
    compiled
        .instructions
        .iter()
        .map(|instruction| render_instruction(owner, instruction, container))
        .collect()
}

fn render_instruction(owner: &Controller, instruction: &Instruction, container: &Container) -> HostNode {
    match instruction {
        Instruction::Text(content) => HostNode::text(content.clone()),
        Instruction::Element {
            tag,
            attributes,
            custom_attributes,
            children,
        } => {
            let node = element_with_attributes(tag, attributes);
            hydrate_attributes(owner, custom_attributes, &node, container);
            for child in children {
                node.append_child(&render_instruction(owner, child, container));
            }
            node
        }
        Instruction::HydrateElement {
            definition,
            attributes,
            custom_attributes,
        } => {
            let host = element_with_attributes(definition.name(), attributes);
            hydrate_attributes(owner, custom_attributes, &host, container);
            let child = Controller::for_element(definition.clone(), container.create_child(), host.clone());
            owner.add_child(child);
            host
        }
    }
}

fn element_with_attributes(tag: &str, attributes: &[(String, String)]) -> HostNode {
    let node = HostNode::element(tag);
    for (name, value) in attributes {
        node.set_attribute(name.clone(), value.clone());
    }
    node
}

fn hydrate_attributes(
    owner: &Controller,
    attributes: &[AttributeInstruction],
    host: &HostNode,
    container: &Container,
) {
    for attribute in attributes {
        host.set_attribute(attribute.definition.name(), attribute.value.clone());
        let child = Controller::for_attribute(attribute.definition.clone(), container.create_child(), host.clone());
        owner.add_child(child);
    }
}
