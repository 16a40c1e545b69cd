//! Session scripts: replayable interaction transcripts.
//!
//! A script is a text file with one command per line and `#` comments:
//!
//! ```text
//! canvas 800 600
//! node root "Root Skill" at 340 180
//! node bow "Archery" under root
//! select bow
//! drag bow to 500 300
//! rename bow "Longbow"
//! remove bow
//! layout
//! ```
//!
//! Aliases are script-local names bound by `node`. [`Script::parse`] checks
//! syntax and alias binding up front, so [`Script::run`] never fails: every
//! command maps onto a [`Controller`] operation or [`Event`].

mod error;
mod parser;

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};

use skilltree_core::{
    geometry::{Point, Size},
    identifier::NodeId,
};

use crate::{
    controller::{Controller, Event, PointerButton},
    scene::{self, Renderer},
};

pub use error::{ScriptError, Span};

/// Alias reserved for `select none`.
const NONE_ALIAS: &str = "none";

/// A script-local node name and where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    name: String,
    span: Span,
}

impl Alias {
    pub(crate) fn new(name: &str, span: Span) -> Self {
        Self {
            name: name.to_string(),
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// A single script command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `canvas <w> <h>`
    Canvas { size: Size },
    /// `node <alias> "<title>" [under <alias>] [at <x> <y>]`
    Node {
        alias: Alias,
        title: String,
        parent: Option<Alias>,
        position: Option<Point>,
    },
    /// `remove <alias>`
    Remove { alias: Alias },
    /// `select <alias>` or `select none`
    Select { alias: Option<Alias> },
    /// `drag <alias> to <x> <y>`: the node's top-left corner ends at `to`.
    Drag { alias: Alias, to: Point },
    /// `rename <alias> "<title>"`
    Rename { alias: Alias, title: String },
    /// `layout`
    Layout,
}

/// A command together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    command: Command,
    span: Span,
}

impl Statement {
    pub(crate) fn new(command: Command, span: Span) -> Self {
        Self { command, span }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Aliases bound to live nodes after a run, in binding order.
pub type Bindings = IndexMap<String, NodeId>;

/// A parsed and alias-checked session script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    statements: Vec<Statement>,
}

impl Script {
    /// Parse and check a script.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error, or the first command that refers to
    /// an alias that is not bound to a live node at that point, rebinds a
    /// live alias, or sets a non-positive canvas size.
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let statements = parser::parse_statements(source)?;
        check_statements(&statements)?;
        debug!(statements = statements.len(); "Parsed session script");
        Ok(Self { statements })
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Replay the script against `controller`.
    ///
    /// Returns the aliases still bound to nodes once every command has run.
    pub fn run<R: Renderer>(&self, controller: &mut Controller<R>) -> Bindings {
        let mut bindings = Bindings::new();

        for statement in &self.statements {
            run_command(statement.command(), controller, &mut bindings);
        }

        info!(
            statements = self.statements.len(),
            nodes = controller.store().len();
            "Session script finished"
        );
        bindings
    }
}

fn run_command<R: Renderer>(
    command: &Command,
    controller: &mut Controller<R>,
    bindings: &mut Bindings,
) {
    let lookup = |bindings: &Bindings, alias: &Alias| {
        let id = bindings.get(alias.name()).copied();
        if id.is_none() {
            warn!(alias = alias.name(); "Alias is not bound to a node");
        }
        id
    };

    match command {
        Command::Canvas { size } => {
            controller.handle(Event::Resize { size: *size });
        }
        Command::Node {
            alias,
            title,
            parent,
            position,
        } => {
            let parent_id = parent.as_ref().and_then(|parent| lookup(bindings, parent));
            let id = controller.add_node(parent_id, title.as_str(), *position);
            bindings.insert(alias.name().to_string(), id);
        }
        Command::Remove { alias } => {
            if let Some(id) = bindings.shift_remove(alias.name()) {
                controller.remove_node(id);
            }
        }
        Command::Select { alias } => {
            let id = alias.as_ref().and_then(|alias| lookup(bindings, alias));
            controller.select(id);
        }
        Command::Drag { alias, to } => {
            let Some(id) = lookup(bindings, alias) else {
                return;
            };
            let Some(position) = controller.store().node(id).map(|node| node.position()) else {
                return;
            };
            controller.handle(Event::PointerDown {
                node: id,
                pointer: scene::anchor(position),
                button: PointerButton::Primary,
            });
            controller.handle(Event::PointerMove {
                pointer: scene::anchor(*to),
            });
            controller.handle(Event::PointerUp);
        }
        Command::Rename { alias, title } => {
            if let Some(id) = lookup(bindings, alias) {
                controller.handle(Event::TitleCommitted {
                    node: id,
                    text: title.clone(),
                });
            }
        }
        Command::Layout => controller.run_layout(),
    }
}

/// Check alias binding and canvas sizes in statement order.
fn check_statements(statements: &[Statement]) -> Result<(), ScriptError> {
    let mut live: IndexSet<&str> = IndexSet::new();

    let require_live = |live: &IndexSet<&str>, alias: &Alias| {
        if live.contains(alias.name()) {
            Ok(())
        } else {
            Err(
                ScriptError::new(
                    format!("unknown alias `{}`", alias.name()),
                    alias.span(),
                    "not bound to a node",
                )
                .with_help("bind the alias with `node <alias> \"<title>\"` first"),
            )
        }
    };

    for statement in statements {
        match statement.command() {
            Command::Canvas { size } => {
                if size.width() <= 0.0 || size.height() <= 0.0 {
                    return Err(ScriptError::new(
                        "canvas size must be positive",
                        statement.span(),
                        "invalid size",
                    ));
                }
            }
            Command::Node { alias, parent, .. } => {
                if let Some(parent) = parent {
                    require_live(&live, parent)?;
                }
                if alias.name() == NONE_ALIAS {
                    return Err(ScriptError::new(
                        "`none` cannot be used as an alias",
                        alias.span(),
                        "reserved name",
                    )
                    .with_help("`select none` clears the selection"));
                }
                if live.contains(alias.name()) {
                    return Err(ScriptError::new(
                        format!("alias `{}` is already bound", alias.name()),
                        alias.span(),
                        "bound again here",
                    )
                    .with_help("remove the node first or pick another alias"));
                }
                live.insert(alias.name());
            }
            Command::Remove { alias } => {
                require_live(&live, alias)?;
                live.shift_remove(alias.name());
            }
            Command::Select { alias: Some(alias) }
            | Command::Drag { alias, .. }
            | Command::Rename { alias, .. } => require_live(&live, alias)?,
            Command::Select { alias: None } | Command::Layout => {}
        }
    }

    Ok(())
}
