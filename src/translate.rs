use std::collections::{BTreeMap, BTreeSet};

use log::*;

use crate::cst::{SyntaxNode, kind};
use crate::diagnostic::Diagnostics;
use crate::error::TranslateError;
use crate::ir::{Input, Module, Name, Wire};
use crate::loc::{HasLoc, Loc};
use crate::lower::{fold_const, lower_expr};

/// Translates one module of a syntax tree into a [`Module`].
///
/// The module named `top` is chosen, or the first one in the tree when `top` is `None`.
/// The wires of the result are in declaration order; see [`crate::depends::sort`].
pub fn translate<N: SyntaxNode>(root: &N, top: Option<&str>, diagnostics: &mut Diagnostics) -> Result<Module, TranslateError> {
    let result = translate_root(root, top, diagnostics);
    if let Err(e) = &result {
        error!("Translation error: {e}");
    }
    result
}

fn translate_root<N: SyntaxNode>(root: &N, top: Option<&str>, diagnostics: &mut Diagnostics) -> Result<Module, TranslateError> {
    if root.kind() != kind::SOURCE_FILE {
        return Err(TranslateError::NotSourceFile(root.kind().to_string()));
    }

    let modules = root.descendants_of_kind(kind::MODULE_DECLARATION);
    let module = match top {
        None => *modules.first().ok_or(TranslateError::NoModule)?,
        Some(top) => *modules
            .iter()
            .find(|module| module_name(**module) == top)
            .ok_or_else(|| TranslateError::NoSuchModule(top.to_string()))?,
    };

    if let Some(error) = module.descendants_of_kind(kind::ERROR).first() {
        return Err(TranslateError::SyntaxError(error.loc()));
    }

    let mut translator = Translator::new(module_name(module), diagnostics);
    translator.ports(module);
    translator.net_declarations(module);
    translator.continuous_assigns(module);
    Ok(translator.finish())
}

fn module_name<N: SyntaxNode>(module: &N) -> String {
    module
        .child_of_kind(kind::SIMPLE_IDENTIFIER)
        .map(|name| name.text().trim().to_string())
        .unwrap_or_default()
}

/// A net that has been declared with a width but may not have a definition yet.
#[derive(Debug)]
struct Declared {
    width: u64,
    is_output: bool,
    loc: Option<Loc>,
}

struct Translator<'d> {
    name: Name,
    inputs: Vec<Input>,
    declared: BTreeMap<Name, Declared>,
    outputs: Vec<Name>,
    wires: Vec<Wire>,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> Translator<'d> {
    fn new(name: Name, diagnostics: &'d mut Diagnostics) -> Translator<'d> {
        info!("Translating module {name}");
        Translator {
            name,
            inputs: vec![],
            declared: BTreeMap::new(),
            outputs: vec![],
            wires: vec![],
            diagnostics,
        }
    }

    fn is_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|input| input.name == name)
    }

    fn is_defined(&self, name: &str) -> bool {
        self.wires.iter().any(|wire| wire.name == name)
    }

    /// Width of a declaration, from its packed dimension if it has one.
    fn width_of<N: SyntaxNode>(&mut self, declaration: &N) -> u64 {
        let Some(dimension) = declaration.child_of_kind(kind::PACKED_DIMENSION) else {
            return 1;
        };

        let width = match dimension.children().as_slice() {
            [msb, lsb] => fold_const(*msb)
                .zip(fold_const(*lsb))
                .and_then(|(msb, lsb)| msb.abs_diff(lsb).checked_add(1)),
            _ => None,
        };
        match width {
            Some(width) => width,
            None => {
                self.diagnostics.warn(
                    dimension.loc(),
                    format!("Could not compute the range `{}`; using width 1", dimension.text()),
                );
                1
            },
        }
    }

    fn ports<N: SyntaxNode>(&mut self, module: &N) {
        for port in module.descendants_of_kind(kind::PORT_DECLARATION) {
            let is_input = port
                .child_of_kind(kind::PORT_DIRECTION)
                .map(|direction| direction.text().trim() == "input")
                .unwrap_or(false);
            let width = self.width_of(port);

            for name_node in port.children_of_kind(kind::SIMPLE_IDENTIFIER) {
                let name = name_node.text().trim().to_string();
                if self.is_input(&name) || self.declared.contains_key(&name) {
                    self.diagnostics.warn(name_node.loc(), format!("Port declared more than once: {name}"));
                    continue;
                }

                if is_input {
                    debug!("input {name} width {width}");
                    self.inputs.push(Input { name, width });
                } else {
                    debug!("output {name} width {width}");
                    self.outputs.push(name.clone());
                    self.declared.insert(name, Declared { width, is_output: true, loc: name_node.loc() });
                }
            }
        }

        for list in module.children_of_kind(kind::LIST_OF_PORTS) {
            for name_node in list.children_of_kind(kind::SIMPLE_IDENTIFIER) {
                let name = name_node.text().trim();
                if !self.is_input(name) && !self.declared.contains_key(name) {
                    self.diagnostics.warn(name_node.loc(), format!("Port has no direction declaration: {name}"));
                }
            }
        }
    }

    fn net_declarations<N: SyntaxNode>(&mut self, module: &N) {
        for declaration in module.descendants_of_kind(kind::NET_DECLARATION) {
            let width = self.width_of(declaration);

            for item in declaration.children() {
                let (name_node, init) = match item.kind() {
                    kind::SIMPLE_IDENTIFIER => (item, None),
                    kind::NET_DECL_ASSIGNMENT => match item.children().as_slice() {
                        [name_node, init] => (*name_node, Some(*init)),
                        _ => {
                            self.diagnostics.warn(item.loc(), "Malformed net declaration assignment");
                            continue;
                        },
                    },
                    _ => continue,
                };
                let name = name_node.text().trim().to_string();

                if self.is_input(&name) {
                    if init.is_some() {
                        self.diagnostics.warn(item.loc(), format!("Assignment to input: {name}"));
                    } else {
                        debug!("net declaration for input {name}");
                    }
                    continue;
                }

                self.declare_net(&name, width, name_node.loc());
                if let Some(init) = init {
                    self.define(&name, init, item.loc());
                }
            }
        }
    }

    fn declare_net(&mut self, name: &str, width: u64, loc: Option<Loc>) {
        match self.declared.get_mut(name) {
            Some(declared) if declared.is_output => {
                if declared.width != width {
                    let message = format!(
                        "Net {name} is declared with width {width} but its output port has width {}; using {width}",
                        declared.width,
                    );
                    self.diagnostics.warn(loc.clone(), message);
                }
                declared.width = width;
                declared.is_output = false;
                declared.loc = loc;
                // still listed in outputs
            },
            Some(_declared) => {
                self.diagnostics.warn(loc, format!("Net declared more than once: {name}"));
            },
            None => {
                debug!("net {name} width {width}");
                self.declared.insert(name.to_string(), Declared { width, is_output: false, loc });
            },
        }
    }

    fn continuous_assigns<N: SyntaxNode>(&mut self, module: &N) {
        for assign in module.descendants_of_kind(kind::CONTINUOUS_ASSIGN) {
            for assignment in assign.children_of_kind(kind::NET_ASSIGNMENT) {
                let children = assignment.children();
                let [lhs, rhs] = children.as_slice() else {
                    self.diagnostics.warn(assignment.loc(), "Malformed continuous assignment");
                    continue;
                };

                if lhs.kind() != kind::SIMPLE_IDENTIFIER {
                    let message = format!("Unsupported assignment target `{}`; only simple names can be assigned", lhs.text());
                    self.diagnostics.warn(lhs.loc(), message);
                    continue;
                }

                let name = lhs.text().trim().to_string();
                if self.is_input(&name) {
                    self.diagnostics.warn(assignment.loc(), format!("Assignment to input: {name}"));
                } else if !self.declared.contains_key(&name) {
                    self.diagnostics.warn(assignment.loc(), format!("Assignment to undeclared net: {name}"));
                } else {
                    self.define(&name, *rhs, assignment.loc());
                }
            }
        }
    }

    fn define<N: SyntaxNode>(&mut self, name: &str, rhs: &N, loc: Option<Loc>) {
        let width = self.declared.get(name).map(|declared| declared.width).unwrap_or(1);
        match lower_expr(rhs, self.diagnostics) {
            Some((value, deps)) => {
                debug!("wire {name} = {value}");
                self.wires.push(Wire { name: name.to_string(), width, value, deps, loc });
            },
            None => {
                self.diagnostics.warn(loc, format!("Skipping assignment to {name}"));
            },
        }
    }

    fn finish(mut self) -> Module {
        let mut seen = BTreeSet::new();
        let mut wires = vec![];
        for mut wire in std::mem::take(&mut self.wires) {
            if self.is_input(&wire.name) {
                self.diagnostics.warn(wire.loc(), format!("Wire has the same name as an input: {}", wire.name));
                continue;
            }
            if !seen.insert(wire.name.clone()) {
                self.diagnostics.warn(wire.loc(), format!("Wire is assigned more than once: {}", wire.name));
                continue;
            }
            wire.deps.retain(|dep| !self.inputs.iter().any(|input| &input.name == dep));
            wires.push(wire);
        }
        self.wires = wires;

        for output in &self.outputs {
            if !self.is_defined(output) {
                let loc = self.declared.get(output).and_then(|declared| declared.loc.clone());
                self.diagnostics.warn(loc, format!("Output declared but never assigned: {output}"));
            }
        }
        for (name, declared) in &self.declared {
            if !self.is_defined(name) && !self.outputs.contains(name) {
                self.diagnostics.info(declared.loc.clone(), format!("Net declared but never assigned: {name}"));
            }
        }

        info!("Translated module {} with {} inputs and {} wires", self.name, self.inputs.len(), self.wires.len());
        Module {
            name: self.name,
            inputs: self.inputs,
            wires: self.wires,
            outputs: self.outputs,
        }
    }
}
